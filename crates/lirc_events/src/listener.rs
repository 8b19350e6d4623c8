use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, warn};

use crate::config::{ListenerConfig, ReadLimits};
use crate::dispatch::EventHandler;
use crate::error::{ErrorSink, ListenerError};
use crate::line_parser::LircLineParser;
use crate::reader::SocketLineReader;
use crate::session::LineSession;

const THREAD_NAME: &str = "lirc-listener";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    /// Terminal. No reads happen after this.
    Stopped,
}

impl ConnectionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => ConnectionState::Connecting,
            1 => ConnectionState::Connected,
            _ => ConnectionState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ConnectionState::Connecting => 0,
            ConnectionState::Connected => 1,
            ConnectionState::Stopped => 2,
        }
    }
}

#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
    fn new(state: ConnectionState) -> Self {
        Self(AtomicU8::new(state.as_u8()))
    }

    fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: ConnectionState) {
        self.0.store(state.as_u8(), Ordering::Release);
    }
}

/// Marks the listener stopped when the worker exits, including by panic.
struct StoppedOnExit {
    state: Arc<StateCell>,
    stop: Arc<AtomicBool>,
}

impl Drop for StoppedOnExit {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.state.set(ConnectionState::Stopped);
    }
}

/// Background reader for one lircd connection.
///
/// The connection is opened by the constructor and read on a dedicated
/// thread; every event is parsed and handed to the handler on that thread,
/// in arrival order. Dropping the listener requests a stop but does not wait.
#[derive(Debug)]
pub struct LircListener {
    socket_path: PathBuf,
    stop: Arc<AtomicBool>,
    state: Arc<StateCell>,
    worker: Option<JoinHandle<()>>,
}

impl LircListener {
    /// Connects and starts listening; never fails.
    ///
    /// If the socket cannot be opened the error is logged and the returned
    /// listener is already [`ConnectionState::Stopped`]. Use
    /// [`LircListener::connect`] to get the error instead.
    pub fn spawn<H: EventHandler>(config: ListenerConfig, handler: H) -> Self {
        let socket_path = config.socket_path.clone();
        match Self::connect(config, handler) {
            Ok(listener) => listener,
            Err(err) => {
                error!("error opening lircd: {err}");
                Self::inert(socket_path)
            }
        }
    }

    /// Connects and starts listening, returning connection errors to the caller.
    pub fn connect<H: EventHandler>(
        config: ListenerConfig,
        handler: H,
    ) -> Result<Self, ListenerError> {
        let ListenerConfig {
            socket_path,
            read_timeout,
            limits,
            error_sink,
        } = config;

        let state = Arc::new(StateCell::new(ConnectionState::Connecting));
        let stop = Arc::new(AtomicBool::new(false));

        let stream = UnixStream::connect(&socket_path).map_err(|source| ListenerError::Connect {
            path: socket_path.clone(),
            source,
        })?;
        stream
            .set_read_timeout(Some(read_timeout))
            .map_err(|source| ListenerError::SetTimeout { source })?;
        state.set(ConnectionState::Connected);

        let worker = {
            let exit_guard = StoppedOnExit {
                state: Arc::clone(&state),
                stop: Arc::clone(&stop),
            };
            thread::Builder::new()
                .name(THREAD_NAME.to_string())
                .spawn(move || run_worker(stream, limits, error_sink, handler, exit_guard))
                .map_err(|source| {
                    state.set(ConnectionState::Stopped);
                    ListenerError::Spawn { source }
                })?
        };

        info!("listening for lircd events on {}", socket_path.display());
        Ok(Self {
            socket_path,
            stop,
            state,
            worker: Some(worker),
        })
    }

    fn inert(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            stop: Arc::new(AtomicBool::new(true)),
            state: Arc::new(StateCell::new(ConnectionState::Stopped)),
            worker: None,
        }
    }

    /// Asks the worker to exit before its next read. Safe to call repeatedly.
    pub fn stop(&self) {
        if !self.stop.swap(true, Ordering::AcqRel) {
            info!("stopping lirc listener");
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    pub fn is_running(&self) -> bool {
        self.state() != ConnectionState::Stopped
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Waits for the worker thread to exit. Does not request a stop.
    pub fn join(mut self) -> thread::Result<()> {
        match self.worker.take() {
            Some(worker) => worker.join(),
            None => Ok(()),
        }
    }
}

impl Drop for LircListener {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
    }
}

fn run_worker<H: EventHandler>(
    stream: UnixStream,
    limits: ReadLimits,
    error_sink: Option<Box<dyn ErrorSink>>,
    handler: H,
    exit_guard: StoppedOnExit,
) {
    let mut reader = SocketLineReader::new(stream, limits);
    let mut session = LineSession::new(LircLineParser::new(), handler).with_error_sink(error_sink);

    match session.run(&mut reader, &exit_guard.stop) {
        Ok(()) => debug!("lirc listener observed stop request"),
        Err(err) => {
            match &err {
                ListenerError::PeerClosed => warn!("lircd closed the socket; stopping"),
                _ => error!("error with lircd socket: {err}"),
            }
            session.report_fatal(&err);
        }
    }
    drop(exit_guard);
}

/// Connects with tokio and dispatches events on the calling task until lircd
/// closes the socket.
///
/// `read_timeout` is unused here; stop by dropping the future.
#[cfg(feature = "tokio")]
pub async fn listen_async<H: EventHandler>(
    config: ListenerConfig,
    handler: H,
) -> Result<(), ListenerError> {
    let ListenerConfig {
        socket_path,
        limits,
        error_sink,
        ..
    } = config;

    let stream = tokio::net::UnixStream::connect(&socket_path)
        .await
        .map_err(|source| ListenerError::Connect {
            path: socket_path.clone(),
            source,
        })?;
    info!("listening for lircd events on {}", socket_path.display());

    let mut reader = crate::reader::AsyncSocketLineReader::new(stream, limits);
    let mut session = LineSession::new(LircLineParser::new(), handler).with_error_sink(error_sink);
    let result = session.run_async(&mut reader).await;
    match &result {
        Ok(()) => info!("lircd closed the socket"),
        Err(err) => {
            error!("error with lircd socket: {err}");
            session.report_fatal(err);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::LircEvent;

    struct Ignore;

    impl EventHandler for Ignore {
        fn handle(&mut self, _event: &LircEvent) {}
    }

    #[test]
    fn state_round_trips_through_cell() {
        let cell = StateCell::new(ConnectionState::Connecting);
        assert_eq!(cell.get(), ConnectionState::Connecting);
        cell.set(ConnectionState::Connected);
        assert_eq!(cell.get(), ConnectionState::Connected);
        cell.set(ConnectionState::Stopped);
        assert_eq!(cell.get(), ConnectionState::Stopped);
    }

    #[test]
    fn missing_socket_yields_stopped_listener() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.sock");

        let listener = LircListener::spawn(ListenerConfig::new(&path), Ignore);
        assert_eq!(listener.state(), ConnectionState::Stopped);
        assert!(!listener.is_running());
        assert_eq!(listener.socket_path(), path.as_path());

        listener.stop();
        listener.stop();
        assert!(listener.join().is_ok());
    }

    #[test]
    fn connect_reports_missing_socket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.sock");

        let err = LircListener::connect(ListenerConfig::new(&path), Ignore).unwrap_err();
        match err {
            ListenerError::Connect { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other}"),
        }
    }
}

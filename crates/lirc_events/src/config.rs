use std::{fmt, path::PathBuf, time::Duration};

use crate::error::ErrorSink;

/// Socket path lircd has historically listened on.
pub const DEFAULT_SOCKET_PATH: &str = "/dev/lircd";

/// Socket path used by lirc 0.9 and later.
pub const MODERN_SOCKET_PATH: &str = "/var/run/lirc/lircd";

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ReadLimits {
    /// Lines longer than this are dropped and reported as too long.
    pub max_line_bytes: usize,
    /// Bytes requested from the socket per read.
    pub chunk_bytes: usize,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            max_line_bytes: 4 * 1024,
            chunk_bytes: 512,
        }
    }
}

/// Per-listener settings.
pub struct ListenerConfig {
    pub socket_path: PathBuf,
    /// Upper bound on how long a stop request can go unnoticed.
    pub read_timeout: Duration,
    pub limits: ReadLimits,
    pub error_sink: Option<Box<dyn ErrorSink>>,
}

impl ListenerConfig {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            ..Self::default()
        }
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn limits(mut self, limits: ReadLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn error_sink(mut self, sink: impl ErrorSink) -> Self {
        self.error_sink = Some(Box::new(sink));
        self
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            read_timeout: DEFAULT_READ_TIMEOUT,
            limits: ReadLimits::default(),
            error_sink: None,
        }
    }
}

impl fmt::Debug for ListenerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerConfig")
            .field("socket_path", &self.socket_path)
            .field("read_timeout", &self.read_timeout)
            .field("limits", &self.limits)
            .field("error_sink", &self.error_sink.is_some())
            .finish()
    }
}

/// Remote filter and repeat throttle applied by a [`crate::Dispatcher`].
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ThrottleConfig {
    /// Only every `interval`-th repeat of a keyed callback fires; `0` disables.
    pub interval: u32,
    /// Accept events from this remote only; `None` accepts all remotes.
    pub remote: Option<String>,
}

impl ThrottleConfig {
    pub fn new(interval: u32, remote: Option<String>) -> Self {
        Self { interval, remote }
    }

    pub fn is_enabled(&self) -> bool {
        self.interval > 0
    }

    pub fn accepts_remote(&self, remote: &str) -> bool {
        self.remote.as_deref().map_or(true, |target| target == remote)
    }
}

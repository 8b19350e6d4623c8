//! Logs lircd button presses; a small front end for `lirc_events`.

mod handler;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use lirc_events::{
    LircListener, ListenerConfig, ListenerError, ThrottleConfig, DEFAULT_SOCKET_PATH,
    MODERN_SOCKET_PATH,
};
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::handler::{build_dispatcher, OutputFormat};

#[derive(Debug, Parser)]
#[command(name = "lirc-listen")]
#[command(about = "Print button presses received from lircd")]
struct Cli {
    /// lircd socket to connect to.
    #[arg(long, env = "LIRC_SOCKET", default_value = DEFAULT_SOCKET_PATH)]
    socket: PathBuf,

    /// Only report every N-th repeat of a held key listed with `--key` (0 disables).
    #[arg(long, default_value_t = 0)]
    throttle: u32,

    /// Ignore events from other remotes.
    #[arg(long)]
    remote: Option<String>,

    /// Key with its own (throttled) handler; may be repeated.
    #[arg(long = "key", value_name = "KEY")]
    keys: Vec<String>,

    /// Print each dispatched event as a JSON line on stdout instead of logging it.
    #[arg(long)]
    json: bool,

    /// Socket read timeout; bounds how long shutdown can take.
    #[arg(long, default_value_t = 1000)]
    read_timeout_ms: u64,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error("listener thread panicked")]
    WorkerPanicked,
    #[error("failed to wait for listener thread: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("read timeout must be greater than zero")]
    ZeroReadTimeout,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()).await {
        error!("{err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if cli.read_timeout_ms == 0 {
        return Err(CliError::ZeroReadTimeout);
    }

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Log
    };
    let dispatcher = build_dispatcher(
        &cli.keys,
        ThrottleConfig::new(cli.throttle, cli.remote),
        format,
    );
    let throttle = dispatcher.throttle();
    info!(
        interval = throttle.interval,
        remote = throttle.remote.as_deref().unwrap_or("*"),
        keys = ?cli.keys,
        "dispatching lircd events"
    );

    let modern_exists = Path::new(MODERN_SOCKET_PATH).exists();
    if let Some(hint) = socket_hint(&cli.socket, modern_exists) {
        warn!("{hint}");
    }
    let config =
        ListenerConfig::new(cli.socket).read_timeout(Duration::from_millis(cli.read_timeout_ms));

    let listener = LircListener::connect(config, dispatcher)?;
    info!("press Ctrl-C to exit");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut poll = tokio::time::interval(Duration::from_millis(100));
    loop {
        tokio::select! {
            signal = &mut ctrl_c => {
                if signal.is_ok() {
                    info!("shutdown signal received");
                }
                break;
            }
            _ = poll.tick() => {
                if !listener.is_running() {
                    break;
                }
            }
        }
    }

    listener.stop();
    tokio::task::spawn_blocking(move || listener.join())
        .await?
        .map_err(|_| CliError::WorkerPanicked)?;
    info!("lirc listener stopped");
    Ok(())
}

/// Newer lirc releases moved the socket; point at it when the legacy path is missing.
fn socket_hint(socket: &Path, modern_exists: bool) -> Option<String> {
    if socket == Path::new(DEFAULT_SOCKET_PATH) && !socket.exists() && modern_exists {
        Some(format!(
            "{DEFAULT_SOCKET_PATH} does not exist; lircd may be listening on {MODERN_SOCKET_PATH} (pass --socket or set LIRC_SOCKET)"
        ))
    } else {
        None
    }
}

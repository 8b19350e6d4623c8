#![forbid(unsafe_code)]
//! Client for the lircd Unix socket.
//!
//! lircd broadcasts one line per decoded button press:
//!
//! ```text
//! <code> <repeat-count> <key> <remote>\n
//! 0000000000 00 KEY_UP onkyo_rc-707m
//! ```
//!
//! This crate provides:
//! - [`parse_line`] / [`LircLineParser`] for that grammar.
//! - [`SocketLineReader`], newline framing over any `Read` with bounded line length.
//! - [`Dispatcher`], per-key callbacks with a `DEFAULT` fallback, a remote filter
//!   and repeat throttling.
//! - [`LircListener`], which owns the socket and runs all of the above on one
//!   background thread until [`LircListener::stop`] is called.
//!
//! ```rust,no_run
//! use lirc_events::{Dispatcher, LircListener, ListenerConfig};
//!
//! let handler = Dispatcher::builder()
//!     .throttle(5)
//!     .remote("onkyo_rc-707m")
//!     .on("KEY_UP", |ev| println!("up ({})", ev.repeat_count))
//!     .fallback(|ev| println!("{}", ev.key))
//!     .build();
//!
//! let listener = LircListener::spawn(ListenerConfig::default(), handler);
//! // ...
//! listener.stop();
//! ```
//!
//! Callbacks run on the listener thread, one at a time, in the order lines
//! arrive. A callback that blocks holds up every later event.

mod config;
mod dispatch;
mod error;
mod event;
mod line_parser;
mod listener;
mod reader;
mod session;

pub use config::{
    ListenerConfig, ReadLimits, ThrottleConfig, DEFAULT_READ_TIMEOUT, DEFAULT_SOCKET_PATH,
    MODERN_SOCKET_PATH,
};
pub use dispatch::{
    Callback, DispatchOutcome, Dispatcher, DispatcherBuilder, EventHandler, DEFAULT_KEY,
};
pub use error::{
    ClassifiedParseError, ErrorDetail, ErrorKind, ErrorSink, LineError, ListenerError, ParseError,
    ParseErrorCode,
};
pub use event::LircEvent;
pub use line_parser::{parse_line, LineParser, LircLineParser};
pub use listener::{ConnectionState, LircListener};
pub use reader::{ReadEvent, SocketLineReader};
pub use session::LineSession;

#[cfg(feature = "tokio")]
pub use listener::listen_async;
#[cfg(feature = "tokio")]
pub use reader::AsyncSocketLineReader;

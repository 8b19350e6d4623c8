use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of a line that could not become an event.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ParseErrorCode {
    Malformed,
}

/// Failure to decode a single lircd line.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ParseError {
    #[error("line does not match `<code> <repeat> <key> <remote>`: {line:?}")]
    Malformed { line: String },
}

/// A problem with one line read from the socket. Never terminal for the stream.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum LineError {
    #[error("invalid UTF-8 in lircd output")]
    InvalidUtf8,
    #[error("line too long (observed_bytes={observed_bytes}, max_line_bytes={max_line_bytes})")]
    LineTooLong {
        observed_bytes: usize,
        max_line_bytes: usize,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Errors that stop (or prevent) a listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to connect to lircd socket `{path}`: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to set read timeout on lircd socket: {source}")]
    SetTimeout {
        #[source]
        source: std::io::Error,
    },
    #[error("failed to spawn listener thread: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },
    #[error("error reading from lircd socket: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },
    #[error("lircd closed the connection")]
    PeerClosed,
}

/// What kind of problem an [`ErrorDetail`] reports.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ErrorKind {
    InvalidUtf8,
    LineTooLong,
    Parse(ParseErrorCode),
    Socket,
    PeerClosed,
}

impl From<&LineError> for ErrorKind {
    fn from(err: &LineError) -> Self {
        match err {
            LineError::InvalidUtf8 => ErrorKind::InvalidUtf8,
            LineError::LineTooLong { .. } => ErrorKind::LineTooLong,
            LineError::Parse(parse) => ErrorKind::Parse(parse.code()),
        }
    }
}

impl From<&ListenerError> for ErrorKind {
    fn from(err: &ListenerError) -> Self {
        match err {
            ListenerError::PeerClosed => ErrorKind::PeerClosed,
            _ => ErrorKind::Socket,
        }
    }
}

/// Reported to an [`ErrorSink`] alongside the log line.
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    /// Line the problem belongs to; `0` when it is not tied to a line.
    pub line_number: usize,
    pub kind: ErrorKind,
    pub details: String,
}

/// Optional consumer hook for errors the listener otherwise only logs.
///
/// Called on the listener thread; must not block.
pub trait ErrorSink: Send + 'static {
    fn on_error(&mut self, detail: ErrorDetail);
}

/// Parser errors expose a stable code next to their message.
pub trait ClassifiedParseError: std::error::Error {
    fn code(&self) -> ParseErrorCode;
    fn summary(&self) -> String {
        self.to_string()
    }
}

impl ClassifiedParseError for ParseError {
    fn code(&self) -> ParseErrorCode {
        match self {
            ParseError::Malformed { .. } => ParseErrorCode::Malformed,
        }
    }
}

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::dispatch::EventHandler;
use crate::error::{ErrorDetail, ErrorKind, ErrorSink, LineError, ListenerError, ParseError};
use crate::event::LircEvent;
use crate::line_parser::LineParser;
#[cfg(feature = "tokio")]
use crate::reader::AsyncSocketLineReader;
use crate::reader::{ReadEvent, SocketLineReader};

/// Parses framed lines and hands the resulting events to a handler.
///
/// Line-level failures are logged (and forwarded to the error sink, if any)
/// and never end the session.
pub struct LineSession<P, H> {
    parser: P,
    handler: H,
    error_sink: Option<Box<dyn ErrorSink>>,
}

impl<P, H> LineSession<P, H>
where
    P: LineParser<Event = LircEvent>,
    P::Error: Into<ParseError>,
    H: EventHandler,
{
    pub fn new(parser: P, handler: H) -> Self {
        Self {
            parser,
            handler,
            error_sink: None,
        }
    }

    pub fn with_error_sink(mut self, sink: Option<Box<dyn ErrorSink>>) -> Self {
        self.error_sink = sink;
        self
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    fn normalize_line(line: &str) -> &str {
        line.strip_suffix('\r').unwrap_or(line)
    }

    /// Decodes one line. `Ok(None)` means the line was blank.
    pub fn decode_line(&mut self, bytes: Vec<u8>) -> Result<Option<LircEvent>, LineError> {
        let Ok(raw_line) = String::from_utf8(bytes) else {
            return Err(LineError::InvalidUtf8);
        };
        let line = Self::normalize_line(&raw_line);
        if line.is_empty() {
            return Ok(None);
        }
        self.parser
            .parse_line(line)
            .map(Some)
            .map_err(|err| LineError::Parse(err.into()))
    }

    /// Decodes and dispatches one line; returns whether an event was handled.
    pub fn process_line(&mut self, line_number: usize, bytes: Vec<u8>) -> bool {
        match self.decode_line(bytes) {
            Ok(Some(event)) => {
                self.handler.handle(&event);
                true
            }
            Ok(None) => false,
            Err(err) => {
                self.report_line_error(line_number, &err);
                false
            }
        }
    }

    pub fn report_line_error(&mut self, line_number: usize, err: &LineError) {
        match err {
            LineError::Parse(_) => warn!("error matching lircd message (line {line_number}): {err}"),
            _ => warn!("dropping lircd line {line_number}: {err}"),
        }
        if let Some(sink) = self.error_sink.as_mut() {
            sink.on_error(ErrorDetail {
                line_number,
                kind: ErrorKind::from(err),
                details: err.to_string(),
            });
        }
    }

    pub fn report_fatal(&mut self, err: &ListenerError) {
        if let Some(sink) = self.error_sink.as_mut() {
            sink.on_error(ErrorDetail {
                line_number: 0,
                kind: ErrorKind::from(err),
                details: err.to_string(),
            });
        }
    }

    /// Reads until `stop` is set or the stream ends.
    ///
    /// `stop` is checked before every read, so with a read timeout on the
    /// underlying stream a stop request is seen within one timeout period.
    /// Returns `Ok(())` only when stopped on request.
    pub fn run<R: Read>(
        &mut self,
        reader: &mut SocketLineReader<R>,
        stop: &AtomicBool,
    ) -> Result<(), ListenerError> {
        while !stop.load(Ordering::Acquire) {
            let Some(next) = reader.next() else {
                return Err(ListenerError::PeerClosed);
            };
            match next {
                ReadEvent::Line { line_number, bytes } => {
                    self.process_line(line_number, bytes);
                }
                ReadEvent::LineTooLong {
                    line_number,
                    observed_bytes,
                    max_line_bytes,
                } => {
                    self.report_line_error(
                        line_number,
                        &LineError::LineTooLong {
                            observed_bytes,
                            max_line_bytes,
                        },
                    );
                }
                ReadEvent::TimedOut => continue,
                ReadEvent::Closed => {
                    if reader.pending_bytes() > 0 {
                        debug!(
                            "discarding {} bytes of unterminated lircd output",
                            reader.pending_bytes()
                        );
                    }
                    return Err(ListenerError::PeerClosed);
                }
                ReadEvent::IoError(source) => return Err(ListenerError::Io { source }),
            }
        }
        Ok(())
    }

    /// Async variant of [`LineSession::run`]; runs until the peer closes.
    ///
    /// A clean close ends the session with `Ok(())`. Cancel by dropping the
    /// future.
    #[cfg(feature = "tokio")]
    pub async fn run_async<R>(
        &mut self,
        reader: &mut AsyncSocketLineReader<R>,
    ) -> Result<(), ListenerError>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        while let Some(next) = reader.next_event().await {
            match next {
                ReadEvent::Line { line_number, bytes } => {
                    self.process_line(line_number, bytes);
                }
                ReadEvent::LineTooLong {
                    line_number,
                    observed_bytes,
                    max_line_bytes,
                } => {
                    self.report_line_error(
                        line_number,
                        &LineError::LineTooLong {
                            observed_bytes,
                            max_line_bytes,
                        },
                    );
                }
                ReadEvent::TimedOut => continue,
                ReadEvent::Closed => break,
                ReadEvent::IoError(source) => return Err(ListenerError::Io { source }),
            }
        }
        Ok(())
    }
}

use std::io::{self, Read};

use super::framer::{is_timeout, LineFramer, ReadEvent};
use crate::config::ReadLimits;

/// Splits a byte stream into newline-terminated lines.
///
/// Reads may end anywhere; partial lines are held until their newline
/// arrives, and one read carrying several lines yields each separately.
/// Read timeouts surface as [`ReadEvent::TimedOut`] so the caller gets a
/// chance to bail out between reads.
pub struct SocketLineReader<R: Read> {
    reader: R,
    framer: LineFramer,
    done: bool,
}

impl<R: Read> SocketLineReader<R> {
    pub fn new(reader: R, limits: ReadLimits) -> Self {
        Self {
            reader,
            framer: LineFramer::new(limits),
            done: false,
        }
    }

    /// Bytes of an unterminated line held from earlier reads.
    pub fn pending_bytes(&self) -> usize {
        self.framer.pending_bytes()
    }
}

impl<R: Read> Iterator for SocketLineReader<R> {
    type Item = ReadEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if let Some(line) = self.framer.next_line() {
                return Some(line);
            }

            match self.reader.read(self.framer.read_buf()) {
                Ok(0) => {
                    self.done = true;
                    return Some(ReadEvent::Closed);
                }
                Ok(n) => self.framer.filled(n),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) if is_timeout(&err) => return Some(ReadEvent::TimedOut),
                Err(err) => {
                    self.done = true;
                    return Some(ReadEvent::IoError(err));
                }
            }
        }
    }
}

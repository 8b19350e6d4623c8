//! Line framing shared by the blocking and async socket readers.
//!
//! Unlike a bounded line reader that owns its byte source, the framer never
//! reads: the caller fills [`LineFramer::read_buf`] from a socket, so read
//! timeouts and peer closes are mapped to [`ReadEvent`]s by the caller, not
//! treated as errors here. One fill can hold several lines, which are drained
//! one [`LineFramer::next_line`] call at a time before the next read. An
//! oversized line is dropped up to its newline and reported with its line
//! number, after which framing resumes.

use std::io;

use crate::config::ReadLimits;

#[derive(Debug)]
pub enum ReadEvent {
    /// A complete line, delimiter removed.
    Line { line_number: usize, bytes: Vec<u8> },
    LineTooLong {
        line_number: usize,
        observed_bytes: usize,
        max_line_bytes: usize,
    },
    /// The read timed out with no complete line; the caller may retry.
    TimedOut,
    /// The peer closed the stream. Terminal.
    Closed,
    /// Any other read failure. Terminal.
    IoError(io::Error),
}

/// Newline framing over a fixed read buffer, independent of the byte source.
///
/// Callers read into [`LineFramer::read_buf`], report the count with
/// [`LineFramer::filled`], then drain lines with [`LineFramer::next_line`].
#[derive(Debug)]
pub(crate) struct LineFramer {
    max_line_bytes: usize,
    buffer: Vec<u8>,
    buffer_pos: usize,
    buffer_len: usize,
    current_line: Vec<u8>,
    observed_bytes: usize,
    discard_mode: bool,
    line_number: usize,
}

impl LineFramer {
    pub(crate) fn new(limits: ReadLimits) -> Self {
        Self {
            max_line_bytes: limits.max_line_bytes,
            buffer: vec![0u8; limits.chunk_bytes.max(1)],
            buffer_pos: 0,
            buffer_len: 0,
            current_line: Vec::new(),
            observed_bytes: 0,
            discard_mode: false,
            line_number: 0,
        }
    }

    pub(crate) fn pending_bytes(&self) -> usize {
        self.observed_bytes
    }

    /// Buffer for the next read. Only valid once [`Self::next_line`] returned `None`.
    pub(crate) fn read_buf(&mut self) -> &mut [u8] {
        self.buffer_pos = 0;
        self.buffer_len = 0;
        &mut self.buffer
    }

    pub(crate) fn filled(&mut self, n: usize) {
        self.buffer_pos = 0;
        self.buffer_len = n.min(self.buffer.len());
    }

    /// Next complete line from buffered bytes, or `None` if more input is needed.
    pub(crate) fn next_line(&mut self) -> Option<ReadEvent> {
        if self.buffer_pos >= self.buffer_len {
            return None;
        }

        let slice = &self.buffer[self.buffer_pos..self.buffer_len];
        let Some(newline_idx) = slice.iter().position(|b| *b == b'\n') else {
            let slice_len = slice.len();
            self.observe_bytes(slice_len);
            if !self.discard_mode {
                let slice = &self.buffer[self.buffer_pos..self.buffer_len];
                self.current_line.extend_from_slice(slice);
            }
            self.buffer_pos = self.buffer_len;
            return None;
        };

        self.observe_bytes(newline_idx);
        if !self.discard_mode {
            let segment = &self.buffer[self.buffer_pos..self.buffer_pos + newline_idx];
            self.current_line.extend_from_slice(segment);
        }
        self.buffer_pos += newline_idx + 1;
        Some(self.finish_line())
    }

    fn finish_line(&mut self) -> ReadEvent {
        let line_number = self.line_number + 1;
        self.line_number = line_number;

        if self.discard_mode {
            let observed_bytes = self.observed_bytes;
            self.reset_line_state();
            return ReadEvent::LineTooLong {
                line_number,
                observed_bytes,
                max_line_bytes: self.max_line_bytes,
            };
        }

        let bytes = std::mem::take(&mut self.current_line);
        self.reset_line_state();
        ReadEvent::Line { line_number, bytes }
    }

    fn reset_line_state(&mut self) {
        self.current_line.clear();
        self.observed_bytes = 0;
        self.discard_mode = false;
    }

    fn observe_bytes(&mut self, additional: usize) {
        self.observed_bytes = self.observed_bytes.saturating_add(additional);
        if self.observed_bytes > self.max_line_bytes && !self.discard_mode {
            self.discard_mode = true;
            self.current_line.clear();
        }
    }
}

pub(crate) fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

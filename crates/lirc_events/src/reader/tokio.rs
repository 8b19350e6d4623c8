use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

use super::framer::{LineFramer, ReadEvent};
use crate::config::ReadLimits;

/// Async counterpart of [`super::SocketLineReader`] with the same framing.
///
/// There is no read timeout here; cancel by dropping the future that polls
/// [`AsyncSocketLineReader::next_event`].
pub struct AsyncSocketLineReader<R: AsyncRead + Unpin> {
    reader: R,
    framer: LineFramer,
    done: bool,
}

impl<R: AsyncRead + Unpin> AsyncSocketLineReader<R> {
    pub fn new(reader: R, limits: ReadLimits) -> Self {
        Self {
            reader,
            framer: LineFramer::new(limits),
            done: false,
        }
    }

    pub fn pending_bytes(&self) -> usize {
        self.framer.pending_bytes()
    }

    pub async fn next_event(&mut self) -> Option<ReadEvent> {
        if self.done {
            return None;
        }

        loop {
            if let Some(line) = self.framer.next_line() {
                return Some(line);
            }

            match self.reader.read(self.framer.read_buf()).await {
                Ok(0) => {
                    self.done = true;
                    return Some(ReadEvent::Closed);
                }
                Ok(n) => self.framer.filled(n),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.done = true;
                    return Some(ReadEvent::IoError(err));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncWriteExt;

    use super::*;

    #[tokio::test]
    async fn frames_lines_written_in_pieces() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut reader = AsyncSocketLineReader::new(rx, ReadLimits::default());

        tx.write_all(b"a3f 05 KEY_").await.unwrap();
        tx.write_all(b"UP sony_tv\n00 01 KEY_OK rc\n").await.unwrap();
        drop(tx);

        let mut lines = Vec::new();
        while let Some(event) = reader.next_event().await {
            match event {
                ReadEvent::Line { bytes, .. } => lines.push(String::from_utf8(bytes).unwrap()),
                ReadEvent::Closed => break,
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(lines, vec!["a3f 05 KEY_UP sony_tv", "00 01 KEY_OK rc"]);
    }
}

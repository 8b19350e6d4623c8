mod framer;
mod sync;

#[cfg(feature = "tokio")]
mod tokio;

pub use framer::ReadEvent;
pub use sync::SocketLineReader;

#[cfg(feature = "tokio")]
pub use self::tokio::AsyncSocketLineReader;

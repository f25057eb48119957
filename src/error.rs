//! Typed errors for the framing codec.
//!
//! Kept as three small `thiserror` enums rather than one opaque error type
//! because callers branch on the specific variant (a `Decode` error keeps a
//! peer connected; `PeerClosed`/`TooLarge`/`Io` do not).

use std::io;

/// Failure encoding a schema message into a caller-supplied buffer.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("encoded message does not fit in the {available}-byte buffer")]
    BufferTooSmall { available: usize },

    #[error("schema codec failed to serialize the message: {0}")]
    Schema(postcard::Error),
}

/// Failure sending one already-framed message on a socket.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("send would block")]
    WouldBlock,

    #[error("partial write, stream is poisoned")]
    Truncated,

    #[error("I/O error sending frame: {0}")]
    Io(#[from] io::Error),
}

/// Failure reading and decoding one frame from a socket.
#[derive(Debug, thiserror::Error)]
pub enum RecvError {
    #[error("peer closed the connection")]
    PeerClosed,

    #[error("frame length exceeds schema maximum")]
    TooLarge,

    #[error("schema codec rejected the frame body: {0}")]
    Decode(postcard::Error),

    #[error("I/O error receiving frame: {0}")]
    Io(#[from] io::Error),
}

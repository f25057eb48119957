//! Length-prefixed, schema-encoded framing over a byte stream.
//!
//! Wire format: `[u32 big-endian length][length bytes of postcard payload]`.
//! No frame ever spans two connections — a short read before the length's
//! worth of bytes arrive means the peer closed the stream.

use std::io::{self, ErrorKind, Read};
use std::os::unix::io::AsRawFd;
use std::os::unix::net::UnixStream;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{EncodeError, RecvError, SendError};

const LENGTH_PREFIX_SIZE: usize = 4;

/// Serialize `msg` into `out_buf` using the schema's canonical wire format.
///
/// Writes no length prefix. Returns the number of bytes written.
pub fn encode_message<M: Serialize>(msg: &M, out_buf: &mut [u8]) -> Result<usize, EncodeError> {
    match postcard::to_slice(msg, out_buf) {
        Ok(written) => Ok(written.len()),
        Err(postcard::Error::SerializeBufferFull) => Err(EncodeError::BufferTooSmall {
            available: out_buf.len(),
        }),
        Err(e) => Err(EncodeError::Schema(e)),
    }
}

/// Build `[u32 BE length][payload]` and perform exactly one non-blocking,
/// `MSG_NOSIGNAL`-flagged `send(2)`.
///
/// A partial write is treated as `SendError::Truncated`: combining the
/// length prefix and payload into a single syscall is what prevents two
/// concurrent senders on the same stream from interleaving their frames, so
/// once that guarantee is broken the stream must be considered poisoned
/// rather than retried.
pub fn frame_send(stream: &UnixStream, payload: &[u8]) -> Result<(), SendError> {
    let mut buf = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);

    let fd = stream.as_raw_fd();
    // SAFETY: `fd` is a valid, open socket fd owned by `stream` for the
    // duration of this call, and `buf` is a valid slice of `buf.len()` bytes.
    let n = unsafe {
        libc::send(
            fd,
            buf.as_ptr().cast(),
            buf.len(),
            libc::MSG_NOSIGNAL | libc::MSG_DONTWAIT,
        )
    };

    if n < 0 {
        let err = io::Error::last_os_error();
        return match err.raw_os_error() {
            Some(libc::EAGAIN) | Some(libc::EWOULDBLOCK) => Err(SendError::WouldBlock),
            _ => Err(SendError::Io(err)),
        };
    }

    if n as usize != buf.len() {
        return Err(SendError::Truncated);
    }

    Ok(())
}

/// Read exactly `buf.len()` bytes, retrying on `Interrupted` and reporting
/// `RecvError::PeerClosed` if the stream hits EOF before `buf` is full.
fn read_phase(stream: &mut UnixStream, buf: &mut [u8]) -> Result<(), RecvError> {
    let mut read = 0;
    while read < buf.len() {
        match stream.read(&mut buf[read..]) {
            Ok(0) => return Err(RecvError::PeerClosed),
            Ok(n) => read += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(RecvError::Io(e)),
        }
    }
    Ok(())
}

/// Blocking receive of one framed, schema-encoded message.
///
/// `max_len` rejects an oversized length prefix (`RecvError::TooLarge`)
/// before a single byte of the body is read.
pub fn frame_recv<M: DeserializeOwned>(
    stream: &mut UnixStream,
    max_len: u32,
) -> Result<M, RecvError> {
    let mut len_buf = [0u8; LENGTH_PREFIX_SIZE];
    read_phase(stream, &mut len_buf)?;
    let len = u32::from_be_bytes(len_buf);

    if len > max_len {
        return Err(RecvError::TooLarge);
    }

    let mut body = vec![0u8; len as usize];
    read_phase(stream, &mut body)?;

    postcard::from_bytes(&body).map_err(RecvError::Decode)
}

//! Frame codec error types.

use thiserror::Error;

use super::MAX_PAYLOAD;

/// Frame codec errors.
///
/// Every decode-side error is fatal to the connection it occurred on:
/// once the byte stream can no longer be trusted to sit on a frame
/// boundary, the only safe move is to close it. A checksum mismatch is
/// deliberately *not* an error — the stream stays synchronised, so
/// decoding reports it as a [`Frame::Corrupt`](super::Frame::Corrupt)
/// value and carries on. `Empty` guards the encode side only: a datagram
/// must carry at least one byte to be framed.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The payload exceeds what a frame may carry.
    #[error("frame announces {size} payload bytes, limit is {MAX_PAYLOAD}")]
    Oversized {
        /// The announced payload length.
        size: usize,
    },

    /// A frame cannot be encoded around an empty payload.
    #[error("a frame cannot carry an empty payload")]
    Empty,

    /// The stream failed or ended mid-frame.
    #[error("framed stream error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Whether this error is a plain end-of-stream (the peer closed the
    /// connection) rather than a protocol violation.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}

/// Result type alias for frame codec operations.
pub type FrameResult<T> = Result<T, FrameError>;

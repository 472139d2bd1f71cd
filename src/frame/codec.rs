//! Frame encoding and decoding.

use bytes::{Buf, BufMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use xxhash_rust::xxh64::{xxh64, Xxh64};

use super::error::{FrameError, FrameResult};
use super::{HEADER_LEN, MAX_PAYLOAD, OVERHEAD, TRAILER_LEN};

/// One decoded frame, borrowing the caller's receive buffer.
#[derive(Debug, PartialEq, Eq)]
pub enum Frame<'a> {
    /// The payload digest matched; the frame may be dispatched.
    Valid {
        /// Destination routing tag.
        tag: u16,
        /// The payload, valid until the next decode reuses the buffer.
        payload: &'a [u8],
    },

    /// The payload digest did not match. The payload must be discarded,
    /// but the stream is still on a frame boundary.
    Corrupt {
        /// Routing tag as it appeared on the wire (possibly damaged too).
        tag: u16,
    },
}

/// Append one encoded frame to `out`.
///
/// # Errors
///
/// Returns an error if the payload is empty or exceeds [`MAX_PAYLOAD`].
pub fn encode_into(tag: u16, payload: &[u8], out: &mut Vec<u8>) -> FrameResult<()> {
    if payload.is_empty() {
        return Err(FrameError::Empty);
    }
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::Oversized {
            size: payload.len(),
        });
    }

    out.reserve(OVERHEAD + payload.len());
    out.put_u16(payload.len() as u16);
    out.put_u16(tag);
    out.put_slice(payload);
    out.put_u64(xxh64(payload, 0));
    Ok(())
}

/// A reusable relay-side frame buffer.
///
/// The buffer reserves [`HEADER_LEN`] bytes in front of and [`TRAILER_LEN`]
/// bytes behind a [`MAX_PAYLOAD`]-sized payload window, so a worker can
/// receive a datagram directly into [`payload_mut`](Self::payload_mut) and
/// then [`seal`](Self::seal) the frame in place. Nothing is allocated per
/// datagram.
pub struct FrameBuf {
    buf: Box<[u8]>,
}

impl FrameBuf {
    /// Allocate a frame buffer sized for a max-length frame (32 KiB).
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: vec![0u8; OVERHEAD + MAX_PAYLOAD].into_boxed_slice(),
        }
    }

    /// The payload window datagrams are received into.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.buf[HEADER_LEN..HEADER_LEN + MAX_PAYLOAD]
    }

    /// Write the header and digest around a payload of `len` bytes already
    /// sitting in the payload window, returning the wire bytes.
    ///
    /// The hasher is reset before and after use; the same instance can be
    /// shared across every frame a worker seals.
    ///
    /// # Errors
    ///
    /// Returns an error if `len` is zero or exceeds [`MAX_PAYLOAD`].
    pub fn seal(&mut self, tag: u16, len: usize, hasher: &mut Xxh64) -> FrameResult<&[u8]> {
        if len == 0 {
            return Err(FrameError::Empty);
        }
        if len > MAX_PAYLOAD {
            return Err(FrameError::Oversized { size: len });
        }

        hasher.reset(0);
        hasher.update(&self.buf[HEADER_LEN..HEADER_LEN + len]);
        let digest = hasher.digest();

        let mut head = &mut self.buf[..HEADER_LEN];
        head.put_u16(len as u16);
        head.put_u16(tag);

        let mut trail = &mut self.buf[HEADER_LEN + len..HEADER_LEN + len + TRAILER_LEN];
        trail.put_u64(digest);

        Ok(&self.buf[..OVERHEAD + len])
    }
}

impl Default for FrameBuf {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode one frame from `reader` into `buf`.
///
/// Reads, in strict order: the 2-byte size, the 2-byte tag, `size` payload
/// bytes, and the 8-byte digest. The recomputed payload digest decides
/// between [`Frame::Valid`] and [`Frame::Corrupt`]; either way the stream
/// is left on the next frame boundary.
///
/// `buf` must hold at least [`MAX_PAYLOAD`] bytes; the hasher is reset on
/// entry so one instance can serve a whole session.
///
/// # Errors
///
/// Returns an error on any I/O failure, on end-of-stream (including
/// mid-frame truncation), or on an announced size of more than
/// [`MAX_PAYLOAD`]. All of these are fatal to the stream.
pub async fn read_frame<'a, R>(
    reader: &mut R,
    buf: &'a mut [u8],
    hasher: &mut Xxh64,
) -> FrameResult<Frame<'a>>
where
    R: AsyncRead + Unpin,
{
    debug_assert!(buf.len() >= MAX_PAYLOAD, "decode buffer too small");

    let mut head = [0u8; HEADER_LEN];
    reader.read_exact(&mut head).await?;
    let mut head = &head[..];
    let size = head.get_u16() as usize;
    let tag = head.get_u16();

    if size > MAX_PAYLOAD {
        return Err(FrameError::Oversized { size });
    }

    reader.read_exact(&mut buf[..size]).await?;

    let mut trail = [0u8; TRAILER_LEN];
    reader.read_exact(&mut trail).await?;
    let wire_digest = u64::from_be_bytes(trail);

    hasher.reset(0);
    hasher.update(&buf[..size]);
    if hasher.digest() != wire_digest {
        return Ok(Frame::Corrupt { tag });
    }

    Ok(Frame::Valid {
        tag,
        payload: &buf[..size],
    })
}

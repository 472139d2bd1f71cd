//! Wire frame codec for the relay → gateway stream.
//!
//! Every UDP datagram travels as one self-delimiting frame:
//!
//! ```text
//! offset 0      : u16 size   (big-endian)  payload length in bytes
//! offset 2      : u16 tag    (big-endian)  destination routing tag
//! offset 4      : size bytes payload
//! offset 4+size : u64 digest (big-endian)  XXH64(seed 0) of the payload
//! ```
//!
//! The digest covers the payload only, never the header or tag. Because the
//! length prefix is always trusted once read, a checksum mismatch discards
//! exactly one frame without desynchronising the stream.

mod codec;
mod error;

pub use codec::{encode_into, read_frame, Frame, FrameBuf};
pub use error::{FrameError, FrameResult};

/// Fixed bytes in front of the payload: `u16` size plus `u16` tag.
pub const HEADER_LEN: usize = 4;

/// Fixed bytes behind the payload: the `u64` payload digest.
pub const TRAILER_LEN: usize = 8;

/// Total framing overhead per datagram.
pub const OVERHEAD: usize = HEADER_LEN + TRAILER_LEN;

/// Largest payload a frame can carry; a max-size frame occupies exactly
/// 32 KiB on the wire.
pub const MAX_PAYLOAD: usize = 32 * 1024 - OVERHEAD;

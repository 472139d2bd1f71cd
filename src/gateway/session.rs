//! Per-connection decode-and-dispatch loop.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncRead;
use tracing::{debug, info, warn};
use xxhash_rust::xxh64::Xxh64;

use super::routes::RouteTable;
use crate::frame::{read_frame, Frame, MAX_PAYLOAD};

/// One gateway session: decodes frames off an accepted connection and
/// forwards each valid payload to the UDP destination its tag names.
///
/// The decode buffer and hasher live for the whole session; nothing is
/// allocated per frame. Per-frame problems (checksum mismatch, unknown
/// tag, forward failure) drop that frame and continue; a decode error
/// ends the session.
pub struct Session {
    routes: Arc<RouteTable>,
    peer: SocketAddr,
    buf: Vec<u8>,
    hasher: Xxh64,
}

impl Session {
    /// Create a session for a connection accepted from `peer`.
    #[must_use]
    pub fn new(routes: Arc<RouteTable>, peer: SocketAddr) -> Self {
        Self {
            routes,
            peer,
            buf: vec![0u8; MAX_PAYLOAD],
            hasher: Xxh64::new(0),
        }
    }

    /// Decode frames until the stream ends or breaks.
    pub async fn run<S>(mut self, mut stream: S)
    where
        S: AsyncRead + Unpin,
    {
        let mut forwarded: u64 = 0;
        let mut dropped: u64 = 0;

        loop {
            match read_frame(&mut stream, &mut self.buf, &mut self.hasher).await {
                Ok(Frame::Valid { tag, payload }) => match self.routes.get(tag) {
                    Some(socket) => {
                        if let Err(e) = socket.send(payload).await {
                            dropped += 1;
                            warn!(peer = %self.peer, tag, error = %e, "forward failed, frame dropped");
                        } else {
                            forwarded += 1;
                        }
                    },
                    None => {
                        dropped += 1;
                        debug!(peer = %self.peer, tag, "unknown tag, frame dropped");
                    },
                },
                Ok(Frame::Corrupt { tag }) => {
                    dropped += 1;
                    warn!(peer = %self.peer, tag, "checksum mismatch, frame dropped");
                },
                Err(e) if e.is_eof() => {
                    debug!(peer = %self.peer, "peer closed the stream");
                    break;
                },
                Err(e) => {
                    warn!(peer = %self.peer, error = %e, "decode failed, closing session");
                    break;
                },
            }
        }

        info!(peer = %self.peer, forwarded, dropped, "session ended");
    }
}

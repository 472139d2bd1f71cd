//! Per-route relay worker.

use tracing::{debug, info};
use xxhash_rust::xxh64::Xxh64;

use super::error::RelayResult;
use super::subscriber::Subscriber;
use super::writer::RemoteWriter;
use crate::frame::FrameBuf;
use crate::pacing::Bucket;

/// One relay worker: reads datagrams from a subscriber, frames them under
/// its routing tag, and writes them through the shared remote writer.
///
/// The frame buffer and hasher are allocated once; the steady-state loop
/// allocates nothing per datagram.
pub struct Worker {
    tag: u16,
    subscriber: Subscriber,
    writer: RemoteWriter,
    bucket: Option<Bucket>,
}

impl Worker {
    /// Assemble a worker. `bucket` is the pacing bucket this worker takes
    /// from before each write, if pacing is configured.
    #[must_use]
    pub fn new(
        tag: u16,
        subscriber: Subscriber,
        writer: RemoteWriter,
        bucket: Option<Bucket>,
    ) -> Self {
        Self {
            tag,
            subscriber,
            writer,
            bucket,
        }
    }

    /// Run the relay loop until the subscriber fails.
    ///
    /// Datagrams are forwarded in receive order; a frame is paced through
    /// the bucket (when configured) before it is handed to the writer.
    ///
    /// # Errors
    ///
    /// Returns the first subscriber failure. Outbound transport failures
    /// never surface here; the writer absorbs them.
    pub async fn run(self) -> RelayResult<()> {
        let mut framed = FrameBuf::new();
        let mut hasher = Xxh64::new(0);

        info!(tag = self.tag, group = %self.subscriber.group(), "relay worker started");

        loop {
            let len = self.subscriber.recv(framed.payload_mut()).await?;
            if len == 0 {
                // A zero-length datagram is legal UDP but cannot be framed.
                debug!(tag = self.tag, "skipping empty datagram");
                continue;
            }

            let wire = framed.seal(self.tag, len, &mut hasher)?;
            if let Some(bucket) = &self.bucket {
                // A take larger than the capacity can never be satisfied;
                // clamping keeps a small bucket pacing instead of hanging.
                bucket.take((wire.len() as u64).min(bucket.capacity())).await;
            }
            self.writer.write(wire).await;
        }
    }
}

//! Token bucket with a dedicated refill task.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::trace;

/// A byte-granular token bucket.
///
/// The bucket is created full and a background task refills it on a fixed
/// cadence for the rest of the process lifetime. `capacity` is both the
/// burst ceiling and the sustained rate in bytes per second: each refill
/// tick credits `capacity × measured_elapsed_seconds`, clamped so that
/// `0 ≤ available ≤ capacity` always holds. Credit that would overflow the
/// ceiling is discarded, never banked.
///
/// Cloning is cheap and shares the underlying allowance, which is how one
/// bucket paces several workers at once.
#[derive(Clone)]
pub struct Bucket {
    shared: Arc<Shared>,
}

struct Shared {
    capacity: u64,
    available: Mutex<u64>,
    refilled: Notify,
}

impl Bucket {
    /// Create a full bucket and spawn its refill task.
    ///
    /// The task runs until the runtime shuts down; buckets are expected to
    /// live for the lifetime of the process.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; configuration validation rejects that
    /// before a bucket is ever built.
    #[must_use]
    pub fn new(capacity: u64, interval: Duration) -> Self {
        assert!(capacity > 0, "bucket capacity must be positive");

        let shared = Arc::new(Shared {
            capacity,
            available: Mutex::new(capacity),
            refilled: Notify::new(),
        });
        tokio::spawn(refill(Arc::clone(&shared), interval));

        Self { shared }
    }

    /// The burst ceiling in bytes.
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.shared.capacity
    }

    /// Consume `n` bytes of allowance, waiting for refills as needed.
    ///
    /// Callers must keep `n` at or below [`capacity`](Self::capacity); a
    /// larger request can never be satisfied and would wait forever. Framed
    /// writes are far below any sane capacity, so workers do not chunk.
    ///
    /// Waiters are served approximately first-come-first-served: everyone
    /// re-checks under the same queue-fair mutex after each refill, so no
    /// caller can be starved while the bucket keeps refilling.
    pub async fn take(&self, n: u64) {
        debug_assert!(
            n <= self.shared.capacity,
            "take({n}) exceeds bucket capacity {}",
            self.shared.capacity
        );

        loop {
            // Register for the next refill *before* inspecting the balance,
            // otherwise a refill landing between the check and the await
            // would be missed.
            let refilled = self.shared.refilled.notified();
            tokio::pin!(refilled);
            refilled.as_mut().enable();

            {
                let mut available = self.shared.available.lock().await;
                if *available >= n {
                    *available -= n;
                    return;
                }
            }

            refilled.await;
        }
    }

    /// Current allowance, for inspection.
    pub async fn available(&self) -> u64 {
        *self.shared.available.lock().await
    }
}

impl std::fmt::Debug for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bucket")
            .field("capacity", &self.shared.capacity)
            .finish_non_exhaustive()
    }
}

/// The refill loop.
///
/// Credits are computed from the measured duration of each sleep, not the
/// nominal interval: a 4 ms sleep that actually took 7 ms credits 7 ms of
/// capacity. A small random factor in [1.0, 1.1] keeps jittery hosts from
/// chronically under-filling.
async fn refill(shared: Arc<Shared>, interval: Duration) {
    loop {
        let slept_at = Instant::now();
        tokio::time::sleep(interval).await;
        let elapsed = slept_at.elapsed();

        let jitter = 1.0 + rand::thread_rng().gen_range(0.0..0.1);
        let credit = (shared.capacity as f64 * elapsed.as_secs_f64() * jitter) as u64;
        if credit == 0 {
            continue;
        }

        let mut available = shared.available.lock().await;
        let before = *available;
        *available = (*available + credit).min(shared.capacity);
        trace!(before, credit, after = *available, "bucket refilled");
        drop(available);

        shared.refilled.notify_waiters();
    }
}

//! Pacing configuration types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for relay-side egress pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Bucket capacity in bytes. This is both the burst ceiling and the
    /// sustained rate in bytes per second.
    pub capacity: u64,

    /// Refill cadence in milliseconds. Crediting always uses the measured
    /// elapsed time, so this only bounds how bursty releases may be.
    #[serde(rename = "interval-ms", default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Whether workers share one bucket or each get their own.
    #[serde(default)]
    pub mode: PacingMode,
}

fn default_interval_ms() -> u64 {
    10
}

impl PacingConfig {
    /// Create a pacing configuration with the default interval.
    #[must_use]
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            interval_ms: default_interval_ms(),
            mode: PacingMode::default(),
        }
    }

    /// The refill cadence as a [`Duration`].
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// How a pacing bucket is allocated across relay workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacingMode {
    /// One bucket shared by every worker; the capacity bounds the total
    /// egress of the process.
    #[default]
    #[serde(rename = "shared")]
    Shared,

    /// One bucket per route; each worker is paced independently.
    #[serde(rename = "per-route")]
    PerRoute,
}

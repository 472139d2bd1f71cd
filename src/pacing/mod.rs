//! Egress bandwidth pacing.
//!
//! A [`Bucket`] releases bytes at a configured rate: it starts full, a
//! dedicated refill task credits it on a fixed cadence, and writers call
//! [`Bucket::take`] before each frame hits the wire. Crediting is based on
//! the *measured* duration of each refill sleep rather than its nominal
//! interval, so hosts with coarse sleep granularity still converge on the
//! configured rate.

mod bucket;
mod config;

pub use bucket::Bucket;
pub use config::{PacingConfig, PacingMode};

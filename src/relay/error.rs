//! Relay error types.

use thiserror::Error;

/// Errors on the relay side.
///
/// Startup errors (`Resolve`, `Subscribe`, `Dial`, `Tls`, `Config`) abort
/// the process. `Recv` is steady-state and terminates only the worker it
/// happened in. Outbound transport errors never appear here at all — the
/// resilient writer absorbs them (see [`RemoteWriter`](super::RemoteWriter)).
#[derive(Debug, Error)]
pub enum RelayError {
    /// The endpoint did not resolve to any address.
    #[error("'{addr}' did not resolve to a usable address")]
    Resolve {
        /// The endpoint as configured.
        addr: String,
    },

    /// Failed to bind or join the local UDP group.
    #[error("failed to subscribe to '{addr}': {source}")]
    Subscribe {
        /// The endpoint as configured.
        addr: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The multicast interface option is not usable.
    #[error("'{value}' is not a usable multicast interface (expected an IPv4 address or an IPv6 interface index)")]
    BadInterface {
        /// The rejected interface value.
        value: String,
    },

    /// The initial dial of the remote gateway failed.
    #[error("failed to reach remote '{remote}': {source}")]
    Dial {
        /// The remote endpoint.
        remote: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Reading from the local UDP socket failed.
    #[error("upstream read failed: {0}")]
    Recv(#[source] std::io::Error),

    /// A datagram could not be framed.
    #[error(transparent)]
    Frame(#[from] crate::frame::FrameError),

    /// TLS client setup failed.
    #[error(transparent)]
    Tls(#[from] crate::tls::TlsError),

    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

/// Result type alias for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;

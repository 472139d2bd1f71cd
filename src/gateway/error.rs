//! Gateway error types.

use thiserror::Error;

/// Errors on the gateway side.
///
/// Everything here is startup-fatal except `Accept`, which stops the
/// acceptor gracefully after running sessions drain. Per-frame problems
/// (checksum mismatch, unknown tag, UDP forward failure) never become
/// errors; sessions log and drop them.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Failed to bind the listening socket.
    #[error("failed to listen on '{addr}': {source}")]
    Bind {
        /// The configured bind endpoint.
        addr: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The accept loop failed.
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// A route endpoint did not resolve to any address.
    #[error("'{addr}' did not resolve to a usable address")]
    Resolve {
        /// The endpoint as configured.
        addr: String,
    },

    /// Failed to prepare the outbound UDP socket for a route.
    #[error("failed to open route to '{addr}': {source}")]
    RouteDial {
        /// The route's destination endpoint.
        addr: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// TLS listener setup failed.
    #[error(transparent)]
    Tls(#[from] crate::tls::TlsError),

    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

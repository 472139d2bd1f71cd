//! TLS setup error types.

use thiserror::Error;

/// Errors raised while building TLS client or server state at startup.
#[derive(Debug, Error)]
pub enum TlsError {
    /// Failed to load a certificate chain.
    #[error("failed to load certificate '{path}': {message}")]
    CertificateLoad {
        /// Path to the certificate file.
        path: String,
        /// What went wrong.
        message: String,
    },

    /// Failed to load a private key.
    #[error("failed to load private key '{path}': {message}")]
    PrivateKeyLoad {
        /// Path to the key file.
        path: String,
        /// What went wrong.
        message: String,
    },

    /// A configured CA bundle could not be used as a trust anchor.
    #[error("failed to use CA bundle '{path}': {message}")]
    CaBundle {
        /// Path to the CA bundle.
        path: String,
        /// What went wrong.
        message: String,
    },

    /// The platform trust store could not be loaded.
    #[error("failed to load system trust roots: {message}")]
    SystemRoots {
        /// What went wrong.
        message: String,
    },

    /// A TLS server needs both a certificate and a key.
    #[error("certificate block needs both cert-file and key-file for a TLS listener")]
    MissingServerKeyPair,

    /// The remote endpoint is not a usable TLS server name.
    #[error("'{name}' is not a valid TLS server name")]
    InvalidServerName {
        /// The rejected name.
        name: String,
    },

    /// Client-certificate verification could not be set up.
    #[error("client authentication setup failed: {message}")]
    ClientAuth {
        /// What went wrong.
        message: String,
    },

    /// rustls rejected the assembled configuration.
    #[error("TLS configuration rejected: {0}")]
    Config(#[from] tokio_rustls::rustls::Error),
}

/// Result type alias for TLS setup operations.
pub type TlsResult<T> = Result<T, TlsError>;

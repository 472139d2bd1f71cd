//! Optional TLS for the relay → gateway transport.
//!
//! TLS engages when a `[certificate]` block is present in the
//! configuration; without one both sides speak plain TCP. The relay acts
//! as the TLS client ([`TlsClient`]), the gateway as the server
//! ([`server::acceptor`]), and mutual authentication is governed by the
//! block's `policy` option.

pub mod client;
mod config;
mod error;
pub mod server;

pub use client::TlsClient;
pub use config::{CertificateConfig, ClientAuthPolicy};
pub use error::{TlsError, TlsResult};

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rustls_pemfile::{certs, private_key};
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::RootCertStore;
use tracing::debug;

/// Load a certificate chain from a PEM file.
pub(crate) fn load_certificates(path: &Path) -> TlsResult<Vec<CertificateDer<'static>>> {
    let file = File::open(path).map_err(|e| TlsError::CertificateLoad {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let mut reader = BufReader::new(file);

    let loaded: Result<Vec<_>, _> = certs(&mut reader).collect();
    let loaded = loaded.map_err(|e| TlsError::CertificateLoad {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    if loaded.is_empty() {
        return Err(TlsError::CertificateLoad {
            path: path.display().to_string(),
            message: "no certificates found in file".to_string(),
        });
    }
    Ok(loaded)
}

/// Load a private key from a PEM file.
pub(crate) fn load_private_key(path: &Path) -> TlsResult<PrivateKeyDer<'static>> {
    let file = File::open(path).map_err(|e| TlsError::PrivateKeyLoad {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let mut reader = BufReader::new(file);

    private_key(&mut reader)
        .map_err(|e| TlsError::PrivateKeyLoad {
            path: path.display().to_string(),
            message: e.to_string(),
        })?
        .ok_or_else(|| TlsError::PrivateKeyLoad {
            path: path.display().to_string(),
            message: "no private key found in file".to_string(),
        })
}

/// Build the trust-anchor store from the configured CA bundles, falling
/// back to the platform's root store when none are configured.
pub(crate) fn load_roots(cert_auth: &[std::path::PathBuf]) -> TlsResult<RootCertStore> {
    let mut roots = RootCertStore::empty();

    if cert_auth.is_empty() {
        let native =
            rustls_native_certs::load_native_certs().map_err(|e| TlsError::SystemRoots {
                message: e.to_string(),
            })?;
        for cert in native {
            // Individual unparsable platform certificates are skipped, the
            // same way browsers treat a half-broken system store.
            let _ = roots.add(cert);
        }
        debug!(count = roots.len(), "loaded system trust roots");
    } else {
        for path in cert_auth {
            for cert in load_certificates(path)? {
                roots.add(cert).map_err(|e| TlsError::CaBundle {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            }
        }
        debug!(count = roots.len(), "loaded configured trust roots");
    }

    if roots.is_empty() {
        return Err(TlsError::SystemRoots {
            message: "trust store is empty".to_string(),
        });
    }
    Ok(roots)
}

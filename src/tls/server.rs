//! Gateway-side TLS listener state.

use std::sync::Arc;

use tokio_rustls::rustls::server::WebPkiClientVerifier;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;
use tracing::debug;

use super::config::{CertificateConfig, ClientAuthPolicy};
use super::error::{TlsError, TlsResult};
use super::{load_certificates, load_private_key, load_roots};

/// Build the TLS acceptor for the gateway listener.
///
/// The certificate block's `policy` selects how connecting relays must
/// authenticate. Verification always runs against `cert-auth` (or the
/// platform roots when empty); the policies differ in whether a client
/// certificate may be absent.
///
/// # Errors
///
/// Returns an error if the block lacks a cert/key pair, if any key
/// material or trust root fails to load, or if rustls rejects the
/// assembled configuration.
pub fn acceptor(config: &CertificateConfig) -> TlsResult<TlsAcceptor> {
    let (cert_path, key_path) = config.keypair().ok_or(TlsError::MissingServerKeyPair)?;

    let certs = load_certificates(cert_path)?;
    let key = load_private_key(key_path)?;

    let builder = match config.policy {
        ClientAuthPolicy::None => ServerConfig::builder().with_no_client_auth(),
        policy => {
            let roots = Arc::new(load_roots(&config.cert_auth)?);
            let verifier = WebPkiClientVerifier::builder(roots);
            let verifier = if policy.requires_client_cert() {
                verifier
            } else {
                verifier.allow_unauthenticated()
            };
            let verifier = verifier.build().map_err(|e| TlsError::ClientAuth {
                message: e.to_string(),
            })?;
            ServerConfig::builder().with_client_cert_verifier(verifier)
        },
    };

    let server_config = builder.with_single_cert(certs, key)?;
    debug!(policy = ?config.policy, "TLS listener configured");

    Ok(TlsAcceptor::from(Arc::new(server_config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keypair_rejected() {
        let config = CertificateConfig::default();
        assert!(matches!(
            acceptor(&config),
            Err(TlsError::MissingServerKeyPair)
        ));
    }

    #[test]
    fn test_missing_key_file_rejected() {
        let config = CertificateConfig {
            cert_file: Some("gateway.pem".into()),
            ..CertificateConfig::default()
        };
        assert!(matches!(
            acceptor(&config),
            Err(TlsError::MissingServerKeyPair)
        ));
    }

    #[test]
    fn test_unreadable_certificate_reported() {
        let config = CertificateConfig {
            cert_file: Some("/nonexistent/gateway.pem".into()),
            key_file: Some("/nonexistent/gateway.key".into()),
            ..CertificateConfig::default()
        };
        assert!(matches!(
            acceptor(&config),
            Err(TlsError::CertificateLoad { .. })
        ));
    }
}

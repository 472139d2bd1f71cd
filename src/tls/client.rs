//! Relay-side TLS client state.

use std::sync::Arc;

use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::ClientConfig;
use tokio_rustls::TlsConnector;
use tracing::debug;

use super::config::CertificateConfig;
use super::error::{TlsError, TlsResult};
use super::{load_certificates, load_private_key, load_roots};

/// A reusable TLS client: one connector plus the server name it dials.
///
/// Built once at startup and cloned into the reconnect task, so every
/// re-dial performs the same handshake as the first connection.
#[derive(Clone)]
pub struct TlsClient {
    connector: TlsConnector,
    server_name: ServerName<'static>,
}

impl TlsClient {
    /// Build client TLS state from a certificate block.
    ///
    /// `remote` is the `host:port` endpoint the relay dials; its host part
    /// becomes the name presented for server certificate verification.
    ///
    /// # Errors
    ///
    /// Returns an error if key material or trust roots cannot be loaded,
    /// or if the remote host is not a usable TLS server name.
    pub fn new(config: &CertificateConfig, remote: &str) -> TlsResult<Self> {
        let host = remote
            .rsplit_once(':')
            .map_or(remote, |(host, _)| host)
            .trim_matches(|c| c == '[' || c == ']');
        let server_name =
            ServerName::try_from(host.to_string()).map_err(|_| TlsError::InvalidServerName {
                name: host.to_string(),
            })?;

        let builder = if config.insecure {
            debug!("server certificate verification disabled");
            ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(danger::no_verification())
        } else {
            ClientConfig::builder().with_root_certificates(load_roots(&config.cert_auth)?)
        };

        let client_config = match config.keypair() {
            Some((cert_path, key_path)) => {
                let certs = load_certificates(cert_path)?;
                let key = load_private_key(key_path)?;
                builder.with_client_auth_cert(certs, key)?
            },
            None => builder.with_no_client_auth(),
        };

        Ok(Self {
            connector: TlsConnector::from(Arc::new(client_config)),
            server_name,
        })
    }

    /// Run the TLS handshake over a freshly dialed TCP stream.
    ///
    /// # Errors
    ///
    /// Returns the handshake failure as an I/O error; callers treat it like
    /// any other dial failure.
    pub async fn handshake(&self, stream: TcpStream) -> std::io::Result<TlsStream<TcpStream>> {
        self.connector
            .connect(self.server_name.clone(), stream)
            .await
    }
}

impl std::fmt::Debug for TlsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsClient")
            .field("server_name", &self.server_name)
            .finish_non_exhaustive()
    }
}

/// Certificate verification bypass for `insecure = true`.
mod danger {
    use std::sync::Arc;

    use tokio_rustls::rustls::client::danger::{
        HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
    };
    use tokio_rustls::rustls::crypto::{
        ring, verify_tls12_signature, verify_tls13_signature, CryptoProvider,
    };
    use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
    use tokio_rustls::rustls::{DigitallySignedStruct, Error, SignatureScheme};

    /// Accepts any server certificate. Handshake signatures are still
    /// checked so a broken peer fails loudly instead of silently.
    #[derive(Debug)]
    struct NoVerification(Arc<CryptoProvider>);

    pub(super) fn no_verification() -> Arc<dyn ServerCertVerifier> {
        Arc::new(NoVerification(Arc::new(ring::default_provider())))
    }

    impl ServerCertVerifier for NoVerification {
        fn verify_server_cert(
            &self,
            _end_entity: &CertificateDer<'_>,
            _intermediates: &[CertificateDer<'_>],
            _server_name: &ServerName<'_>,
            _ocsp_response: &[u8],
            _now: UnixTime,
        ) -> Result<ServerCertVerified, Error> {
            Ok(ServerCertVerified::assertion())
        }

        fn verify_tls12_signature(
            &self,
            message: &[u8],
            cert: &CertificateDer<'_>,
            dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, Error> {
            verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
        }

        fn verify_tls13_signature(
            &self,
            message: &[u8],
            cert: &CertificateDer<'_>,
            dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, Error> {
            verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
        }

        fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
            self.0
                .signature_verification_algorithms
                .supported_schemes()
        }
    }
}

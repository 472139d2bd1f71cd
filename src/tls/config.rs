//! TLS configuration types.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The `[certificate]` block shared by relay and gateway configurations.
///
/// Presence of the block turns TLS on for the reliable transport. On the
/// gateway `cert-file` and `key-file` are mandatory; on the relay they are
/// optional and, when present, are offered as the client certificate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateConfig {
    /// PEM certificate chain presented to the peer.
    #[serde(rename = "cert-file")]
    pub cert_file: Option<PathBuf>,

    /// PEM private key matching `cert-file`.
    #[serde(rename = "key-file")]
    pub key_file: Option<PathBuf>,

    /// CA bundles trusted when verifying the peer. Empty means the
    /// platform's root store.
    #[serde(rename = "cert-auth")]
    pub cert_auth: Vec<PathBuf>,

    /// Skip server certificate verification entirely (relay side only).
    pub insecure: bool,

    /// How the gateway treats client certificates.
    pub policy: ClientAuthPolicy,
}

impl CertificateConfig {
    /// The presentable certificate/key pair, when both halves are
    /// configured.
    #[must_use]
    pub fn keypair(&self) -> Option<(&Path, &Path)> {
        match (&self.cert_file, &self.key_file) {
            (Some(cert), Some(key)) => Some((cert.as_path(), key.as_path())),
            _ => None,
        }
    }
}

/// Client-certificate policy for the gateway listener.
///
/// An unknown policy string is a configuration parse error, which aborts
/// startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientAuthPolicy {
    /// Ask for a client certificate but accept its absence; verify one if
    /// presented.
    #[serde(rename = "request")]
    Request,

    /// Demand a client certificate.
    #[serde(rename = "require", alias = "any")]
    Require,

    /// Verify a client certificate if one is given, absence is fine.
    #[serde(rename = "verify")]
    Verify,

    /// Never ask for a client certificate.
    #[serde(rename = "none")]
    None,

    /// Demand and verify a client certificate.
    #[default]
    #[serde(rename = "require+verify")]
    RequireAndVerify,
}

impl ClientAuthPolicy {
    /// Whether a connecting relay must present a certificate.
    #[must_use]
    pub fn requires_client_cert(&self) -> bool {
        matches!(self, Self::Require | Self::RequireAndVerify)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let config: CertificateConfig = toml::from_str("").unwrap();
        assert_eq!(config.policy, ClientAuthPolicy::RequireAndVerify);
        assert!(!config.insecure);
        assert!(config.cert_auth.is_empty());
        assert!(config.keypair().is_none());
    }

    #[test]
    fn test_policy_aliases() {
        for (text, expected) in [
            ("request", ClientAuthPolicy::Request),
            ("require", ClientAuthPolicy::Require),
            ("any", ClientAuthPolicy::Require),
            ("verify", ClientAuthPolicy::Verify),
            ("none", ClientAuthPolicy::None),
            ("require+verify", ClientAuthPolicy::RequireAndVerify),
        ] {
            let config: CertificateConfig =
                toml::from_str(&format!("policy = \"{text}\"")).unwrap();
            assert_eq!(config.policy, expected, "policy {text}");
        }
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let parsed = toml::from_str::<CertificateConfig>("policy = \"whatever\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_full_block() {
        let config: CertificateConfig = toml::from_str(
            r#"
            cert-file = "relay.pem"
            key-file = "relay.key"
            cert-auth = ["ca.pem", "extra-ca.pem"]
            insecure = true
            policy = "none"
            "#,
        )
        .unwrap();
        assert!(config.keypair().is_some());
        assert_eq!(config.cert_auth.len(), 2);
        assert!(config.insecure);
    }
}

//! Configuration type definitions.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};
use crate::pacing::PacingConfig;
use crate::tls::CertificateConfig;

/// Relay-side configuration: where to send frames and which local UDP
/// groups to subscribe to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// The gateway endpoint to dial, as `host:port`.
    pub remote: String,

    /// Optional TLS for the outbound connection.
    #[serde(default)]
    pub certificate: Option<CertificateConfig>,

    /// Optional egress pacing.
    #[serde(default)]
    pub pacing: Option<PacingConfig>,

    /// Local UDP groups to subscribe to, one relay worker each.
    #[serde(default, rename = "route")]
    pub routes: Vec<RouteConfig>,
}

impl RelayConfig {
    /// Check the configuration for startup-fatal mistakes.
    ///
    /// # Errors
    ///
    /// Returns the first problem found; any error aborts the process.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.remote.is_empty() {
            return Err(ConfigError::MissingEndpoint { field: "remote" });
        }
        if let Some(pacing) = &self.pacing {
            if pacing.capacity == 0 {
                return Err(ConfigError::InvalidPacing {
                    message: "capacity must be positive".to_string(),
                });
            }
            if pacing.interval_ms == 0 {
                return Err(ConfigError::InvalidPacing {
                    message: "interval-ms must be positive".to_string(),
                });
            }
        }
        validate_routes(&self.routes)
    }
}

/// Gateway-side configuration: where to listen and where each tag's
/// payloads are forwarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// The `host:port` endpoint to listen on.
    pub local: String,

    /// Maximum concurrent relay sessions; 0 selects the default of 256.
    #[serde(default)]
    pub clients: u16,

    /// Optional TLS for the listener.
    #[serde(default)]
    pub certificate: Option<CertificateConfig>,

    /// UDP destinations, one per routing tag.
    #[serde(default, rename = "route")]
    pub routes: Vec<RouteConfig>,
}

impl GatewayConfig {
    /// Check the configuration for startup-fatal mistakes.
    ///
    /// # Errors
    ///
    /// Returns the first problem found; any error aborts the process.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.local.is_empty() {
            return Err(ConfigError::MissingEndpoint { field: "local" });
        }
        validate_routes(&self.routes)
    }
}

/// One route: a UDP endpoint plus the routing tag that names it on the
/// wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// The UDP endpoint as `host:port`. On the relay this is the group to
    /// subscribe to; on the gateway, the destination to forward to.
    pub ip: String,

    /// Explicit routing tag. 0 (the default) derives the tag from the
    /// numeric port of `ip`.
    #[serde(default, alias = "port")]
    pub id: u16,

    /// Multicast interface to join on: an IPv4 interface address or an
    /// IPv6 interface index. Ignored for unicast endpoints.
    #[serde(default)]
    pub interface: Option<String>,
}

impl RouteConfig {
    /// The routing tag this route travels under.
    ///
    /// # Errors
    ///
    /// Returns an error if no explicit id is set and no non-zero port can
    /// be derived from the endpoint.
    pub fn tag(&self) -> ConfigResult<u16> {
        if self.id != 0 {
            return Ok(self.id);
        }
        match endpoint_port(&self.ip) {
            Some(port) if port != 0 => Ok(port),
            _ => Err(ConfigError::UnresolvableTag {
                addr: self.ip.clone(),
            }),
        }
    }
}

fn validate_routes(routes: &[RouteConfig]) -> ConfigResult<()> {
    if routes.is_empty() {
        return Err(ConfigError::NoRoutes);
    }

    let mut seen = HashSet::new();
    for route in routes {
        let tag = route.tag()?;
        if !seen.insert(tag) {
            return Err(ConfigError::DuplicateTag { tag });
        }
    }
    Ok(())
}

/// Extract the port from a `host:port` endpoint without resolving the
/// host. Handles bracketed IPv6 (`[::1]:4040`).
#[must_use]
pub fn endpoint_port(addr: &str) -> Option<u16> {
    let (_, port) = addr.rsplit_once(':')?;
    port.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(ip: &str, id: u16) -> RouteConfig {
        RouteConfig {
            ip: ip.to_string(),
            id,
            interface: None,
        }
    }

    #[test]
    fn test_endpoint_port() {
        assert_eq!(endpoint_port("239.1.2.3:5000"), Some(5000));
        assert_eq!(endpoint_port("[ff02::1]:7000"), Some(7000));
        assert_eq!(endpoint_port("no-port-here"), None);
        assert_eq!(endpoint_port("bad:port"), None);
    }

    #[test]
    fn test_tag_defaults_to_port() {
        assert_eq!(route("239.1.2.3:5000", 0).tag().unwrap(), 5000);
        assert_eq!(route("239.1.2.3:5000", 42).tag().unwrap(), 42);
    }

    #[test]
    fn test_tag_unresolvable() {
        assert!(route("239.1.2.3", 0).tag().is_err());
        assert!(route("239.1.2.3:0", 0).tag().is_err());
    }

    #[test]
    fn test_relay_validation() {
        let config = RelayConfig {
            remote: "gw.example.net:4040".to_string(),
            certificate: None,
            pacing: None,
            routes: vec![route("239.1.2.3:5000", 0)],
        };
        assert!(config.validate().is_ok());

        let no_routes = RelayConfig {
            routes: Vec::new(),
            ..config.clone()
        };
        assert!(matches!(no_routes.validate(), Err(ConfigError::NoRoutes)));

        let no_remote = RelayConfig {
            remote: String::new(),
            ..config.clone()
        };
        assert!(matches!(
            no_remote.validate(),
            Err(ConfigError::MissingEndpoint { field: "remote" })
        ));

        let zero_capacity = RelayConfig {
            pacing: Some(crate::pacing::PacingConfig::new(0)),
            ..config
        };
        assert!(matches!(
            zero_capacity.validate(),
            Err(ConfigError::InvalidPacing { .. })
        ));
    }

    #[test]
    fn test_gateway_duplicate_tags_fatal() {
        let config = GatewayConfig {
            local: "0.0.0.0:4040".to_string(),
            clients: 0,
            certificate: None,
            routes: vec![route("127.0.0.1:9100", 7), route("10.0.0.1:9200", 7)],
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateTag { tag: 7 })
        ));
    }

    #[test]
    fn test_gateway_derived_tag_collision() {
        let config = GatewayConfig {
            local: "0.0.0.0:4040".to_string(),
            clients: 0,
            certificate: None,
            routes: vec![route("127.0.0.1:9100", 0), route("10.0.0.1:9100", 0)],
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateTag { tag: 9100 })
        ));
    }
}

//! The routing-tag → UDP destination table.

use std::collections::HashMap;
use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tracing::info;

use super::error::{GatewayError, GatewayResult};
use crate::config::RouteConfig;

/// Immutable map from routing tag to a pre-connected outbound UDP socket.
///
/// Built once at startup and shared read-only by every session, so
/// lookups take no locks. Tags must be unique; a duplicate is a fatal
/// startup error (configuration validation catches it first, the build
/// double-checks).
pub struct RouteTable {
    routes: HashMap<u16, UdpSocket>,
}

impl RouteTable {
    /// Resolve every route and connect its outbound socket.
    ///
    /// # Errors
    ///
    /// Returns an error on an unresolvable destination, a socket failure,
    /// or a duplicate tag.
    pub async fn build(routes: &[RouteConfig]) -> GatewayResult<Self> {
        let mut table = HashMap::with_capacity(routes.len());

        for route in routes {
            let tag = route.tag()?;
            let dest = resolve(&route.ip).await?;
            let socket = connect(dest).await.map_err(|e| GatewayError::RouteDial {
                addr: route.ip.clone(),
                source: e,
            })?;

            if table.insert(tag, socket).is_some() {
                return Err(GatewayError::Config(
                    crate::config::ConfigError::DuplicateTag { tag },
                ));
            }
            info!(tag, dest = %dest, "route registered");
        }

        Ok(Self { routes: table })
    }

    /// Look up the outbound socket for a tag.
    #[must_use]
    pub fn get(&self, tag: u16) -> Option<&UdpSocket> {
        self.routes.get(&tag)
    }

    /// Number of configured routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

async fn resolve(addr: &str) -> GatewayResult<SocketAddr> {
    let mut resolved =
        tokio::net::lookup_host(addr)
            .await
            .map_err(|e| GatewayError::RouteDial {
                addr: addr.to_string(),
                source: e,
            })?;
    resolved.next().ok_or_else(|| GatewayError::Resolve {
        addr: addr.to_string(),
    })
}

async fn connect(dest: SocketAddr) -> std::io::Result<UdpSocket> {
    let bind_addr: SocketAddr = if dest.is_ipv4() {
        (std::net::Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let socket = UdpSocket::bind(bind_addr).await?;
    socket.connect(dest).await?;
    Ok(socket)
}

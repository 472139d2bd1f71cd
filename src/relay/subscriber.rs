//! Local UDP subscription.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tracing::info;

use super::error::{RelayError, RelayResult};

/// A bound local UDP source, unicast or multicast.
///
/// The resolved IP class decides the flavour: a multicast address is
/// joined as a group (optionally on a named interface), anything else is a
/// plain unicast bind.
pub struct Subscriber {
    socket: UdpSocket,
    group: SocketAddr,
}

impl Subscriber {
    /// Resolve `addr` and bind the matching UDP source.
    ///
    /// For multicast groups `interface` selects where to join: an IPv4
    /// interface address, or an IPv6 interface index. `None` lets the
    /// kernel pick.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint does not resolve, the interface
    /// value is unusable, or binding/joining fails.
    pub async fn bind(addr: &str, interface: Option<&str>) -> RelayResult<Self> {
        let group = resolve(addr).await?;

        let socket = if group.ip().is_multicast() {
            join_multicast(group, interface)?
        } else {
            UdpSocket::bind(group)
                .await
                .map_err(|e| subscribe_error(addr, e))?
        };

        info!(
            group = %group,
            multicast = group.ip().is_multicast(),
            "subscribed to local UDP source"
        );
        Ok(Self { socket, group })
    }

    /// The address this subscriber is bound to. With an ephemeral port in
    /// the configuration this carries the actual port.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot report its address.
    pub fn local_addr(&self) -> RelayResult<SocketAddr> {
        self.socket
            .local_addr()
            .map_err(|e| subscribe_error(&self.group.to_string(), e))
    }

    /// The group or endpoint this subscriber serves.
    #[must_use]
    pub fn group(&self) -> SocketAddr {
        self.group
    }

    /// Receive one datagram into `buf`, returning its length.
    ///
    /// # Errors
    ///
    /// Any receive failure is fatal to the worker that owns this
    /// subscriber.
    pub async fn recv(&self, buf: &mut [u8]) -> RelayResult<usize> {
        let (len, _peer) = self.socket.recv_from(buf).await.map_err(RelayError::Recv)?;
        Ok(len)
    }
}

async fn resolve(addr: &str) -> RelayResult<SocketAddr> {
    let mut resolved = tokio::net::lookup_host(addr)
        .await
        .map_err(|e| subscribe_error(addr, e))?;
    resolved.next().ok_or_else(|| RelayError::Resolve {
        addr: addr.to_string(),
    })
}

fn subscribe_error(addr: &str, source: std::io::Error) -> RelayError {
    RelayError::Subscribe {
        addr: addr.to_string(),
        source,
    }
}

/// Bind the group port with address reuse and join the group.
///
/// Several subscribers (or other processes) may listen to the same group
/// on one host, so the port is bound with `SO_REUSEADDR` before joining.
fn join_multicast(group: SocketAddr, interface: Option<&str>) -> RelayResult<UdpSocket> {
    let domain = match group {
        SocketAddr::V4(_) => Domain::IPV4,
        SocketAddr::V6(_) => Domain::IPV6,
    };
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))
        .map_err(|e| subscribe_error(&group.to_string(), e))?;
    socket
        .set_reuse_address(true)
        .map_err(|e| subscribe_error(&group.to_string(), e))?;
    socket
        .set_nonblocking(true)
        .map_err(|e| subscribe_error(&group.to_string(), e))?;

    let bind_addr: SocketAddr = match group {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, group.port()).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, group.port()).into(),
    };
    socket
        .bind(&bind_addr.into())
        .map_err(|e| subscribe_error(&group.to_string(), e))?;

    match group.ip() {
        IpAddr::V4(group_ip) => {
            let iface = match interface {
                Some(value) => value.parse::<Ipv4Addr>().map_err(|_| {
                    RelayError::BadInterface {
                        value: value.to_string(),
                    }
                })?,
                None => Ipv4Addr::UNSPECIFIED,
            };
            socket
                .join_multicast_v4(&group_ip, &iface)
                .map_err(|e| subscribe_error(&group.to_string(), e))?;
        },
        IpAddr::V6(group_ip) => {
            let index = match interface {
                Some(value) => {
                    value
                        .parse::<u32>()
                        .map_err(|_| RelayError::BadInterface {
                            value: value.to_string(),
                        })?
                },
                None => 0,
            };
            socket
                .join_multicast_v6(&group_ip, index)
                .map_err(|e| subscribe_error(&group.to_string(), e))?;
        },
    }

    UdpSocket::from_std(socket.into()).map_err(|e| subscribe_error(&group.to_string(), e))
}

//! The gateway listener and accept loop.

use std::net::SocketAddr;
use std::sync::Arc;

use socket2::SockRef;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, error, info, warn};

use super::error::{GatewayError, GatewayResult};
use super::routes::RouteTable;
use super::session::Session;
use crate::config::GatewayConfig;
use crate::tls;

/// Session cap applied when the configuration leaves `clients` at 0.
pub const DEFAULT_CLIENTS: u16 = 256;

/// The gateway acceptor: owns the listening socket, the route table, and
/// the session-concurrency semaphore.
pub struct Acceptor {
    listener: TcpListener,
    local_addr: SocketAddr,
    tls: Option<TlsAcceptor>,
    routes: Arc<RouteTable>,
    permits: Arc<Semaphore>,
    max_clients: u16,
}

impl Acceptor {
    /// Build the full gateway from its configuration: route table, TLS
    /// listener state, bound socket, semaphore.
    ///
    /// # Errors
    ///
    /// Any failure here is startup-fatal: invalid configuration, an
    /// unreachable route destination, unusable TLS material, or a bind
    /// failure.
    pub async fn bind(config: &GatewayConfig) -> GatewayResult<Self> {
        config.validate()?;

        let routes = Arc::new(RouteTable::build(&config.routes).await?);
        let tls = match &config.certificate {
            Some(certificate) => Some(tls::server::acceptor(certificate)?),
            None => None,
        };

        let listener = TcpListener::bind(&config.local)
            .await
            .map_err(|e| GatewayError::Bind {
                addr: config.local.clone(),
                source: e,
            })?;
        let local_addr = listener.local_addr().map_err(|e| GatewayError::Bind {
            addr: config.local.clone(),
            source: e,
        })?;

        let max_clients = if config.clients == 0 {
            DEFAULT_CLIENTS
        } else {
            config.clients
        };

        info!(
            addr = %local_addr,
            routes = routes.len(),
            max_clients,
            tls = tls.is_some(),
            "gateway listening"
        );

        Ok(Self {
            listener,
            local_addr,
            tls,
            routes,
            permits: Arc::new(Semaphore::new(usize::from(max_clients))),
            max_clients,
        })
    }

    /// The bound listening address. With an ephemeral port in the
    /// configuration this carries the actual port.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept relay connections until `accept` fails, spawning one session
    /// per connection and never exceeding the session cap.
    ///
    /// On an accept failure the loop stops taking new connections and
    /// waits for every running session to finish before returning.
    ///
    /// # Errors
    ///
    /// Returns the accept failure after the graceful drain.
    pub async fn run(self) -> GatewayResult<()> {
        let accept_error = loop {
            let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
                // The semaphore is never closed; this arm exists to avoid
                // an unwrap on the acquire result.
                break None;
            };

            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    if let Err(e) = SockRef::from(&stream).set_keepalive(true) {
                        warn!(peer = %peer, error = %e, "failed to enable TCP keep-alive");
                    }
                    debug!(peer = %peer, "relay connected");

                    let routes = Arc::clone(&self.routes);
                    let tls = self.tls.clone();
                    tokio::spawn(async move {
                        let _permit = permit;
                        let session = Session::new(routes, peer);
                        match tls {
                            Some(acceptor) => match acceptor.accept(stream).await {
                                Ok(stream) => session.run(stream).await,
                                Err(e) => {
                                    warn!(peer = %peer, error = %e, "TLS handshake failed");
                                },
                            },
                            None => session.run(stream).await,
                        }
                    });
                },
                Err(e) => {
                    error!(error = %e, "accept failed, stopping gateway");
                    break Some(e);
                },
            }
        };

        // Graceful stop: reclaim every permit so running sessions finish
        // before the acceptor returns.
        let _drained = self
            .permits
            .acquire_many(u32::from(self.max_clients))
            .await;
        info!("gateway stopped");

        match accept_error {
            Some(e) => Err(GatewayError::Accept(e)),
            None => Ok(()),
        }
    }
}

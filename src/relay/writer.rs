//! The self-healing outbound connection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::Mutex;
use tokio_rustls::client::TlsStream;
use tracing::{debug, info, warn};

use super::error::{RelayError, RelayResult};
use crate::tls::TlsClient;

/// Per-attempt timeout when re-dialing the remote.
const DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Pause between failed redial attempts, so a refusing remote is not
/// hammered in a tight loop.
const REDIAL_PAUSE: Duration = Duration::from_millis(250);

/// The active outbound sink.
enum Sink {
    Tcp(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
    Udp(UdpSocket),
    /// The remote is unreachable; writes vanish here until the redial
    /// task installs a fresh stream.
    Down,
}

impl Sink {
    async fn send_all(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.write_all(bytes).await,
            Self::Tls(stream) => stream.write_all(bytes).await,
            Self::Udp(socket) => socket.send(bytes).await.map(|_| ()),
            Self::Down => Ok(()),
        }
    }

    fn is_udp(&self) -> bool {
        matches!(self, Self::Udp(_))
    }
}

/// A reliable byte sink that outlives its transport.
///
/// `write` never fails and never reports a short write. While the remote
/// is reachable, each call writes the whole buffer under an exclusive
/// lock, so concurrent writers can never interleave two frames. When a
/// write fails, the connection flips to a null sink and a background task
/// re-dials the remote with a [`DIAL_TIMEOUT`] per attempt, forever;
/// everything written in between is deliberately discarded. The upstream
/// producers are real-time UDP sources — blocking them, or replaying a
/// backlog at reconnect, would be worse than the loss.
///
/// The one exception is a UDP remote: datagram sockets have no connection
/// to heal, so write errors are ignored per-write.
///
/// Cloning shares the underlying connection.
#[derive(Clone)]
pub struct RemoteWriter {
    inner: Arc<Inner>,
}

struct Inner {
    remote: String,
    tls: Option<TlsClient>,
    sink: Mutex<Sink>,
    redialing: AtomicBool,
}

impl RemoteWriter {
    /// Dial the remote gateway over TCP, wrapping in TLS when configured.
    ///
    /// # Errors
    ///
    /// The initial dial (and handshake) must succeed; a failure here is
    /// fatal at startup. Later failures are absorbed by the writer.
    pub async fn connect(remote: &str, tls: Option<TlsClient>) -> RelayResult<Self> {
        let sink = dial(remote, tls.as_ref()).await.map_err(|e| RelayError::Dial {
            remote: remote.to_string(),
            source: e,
        })?;

        Ok(Self {
            inner: Arc::new(Inner {
                remote: remote.to_string(),
                tls,
                sink: Mutex::new(sink),
                redialing: AtomicBool::new(false),
            }),
        })
    }

    /// Use a connected UDP socket as the remote instead of TCP.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint cannot be resolved or connected.
    pub async fn connect_udp(remote: &str) -> RelayResult<Self> {
        let dial_error = |e| RelayError::Dial {
            remote: remote.to_string(),
            source: e,
        };

        let target = tokio::net::lookup_host(remote)
            .await
            .map_err(dial_error)?
            .next()
            .ok_or_else(|| RelayError::Resolve {
                addr: remote.to_string(),
            })?;
        let bind_addr: std::net::SocketAddr = if target.is_ipv4() {
            (std::net::Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind_addr).await.map_err(dial_error)?;
        socket.connect(target).await.map_err(dial_error)?;

        Ok(Self {
            inner: Arc::new(Inner {
                remote: remote.to_string(),
                tls: None,
                sink: Mutex::new(Sink::Udp(socket)),
                redialing: AtomicBool::new(false),
            }),
        })
    }

    /// Write one frame. Infallible by contract: transport failures turn
    /// into dropped bytes, never into an error or a blocked producer.
    pub async fn write(&self, bytes: &[u8]) {
        let mut sink = self.inner.sink.lock().await;
        if let Err(e) = sink.send_all(bytes).await {
            if sink.is_udp() {
                debug!(remote = %self.inner.remote, error = %e, "UDP remote write failed, ignoring");
                return;
            }

            warn!(
                remote = %self.inner.remote,
                error = %e,
                "remote write failed, dropping frames until reconnected"
            );
            *sink = Sink::Down;
            // Both the flag flip and the sink swap happen under the sink
            // lock; the redial task clears the flag under the same lock
            // when it installs the replacement stream.
            if !self.inner.redialing.swap(true, Ordering::AcqRel) {
                self.spawn_redial();
            }
        }
    }

    fn spawn_redial(&self) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let mut attempt = 0u64;
            loop {
                attempt += 1;
                match tokio::time::timeout(DIAL_TIMEOUT, dial(&inner.remote, inner.tls.as_ref()))
                    .await
                {
                    Ok(Ok(fresh)) => {
                        let mut sink = inner.sink.lock().await;
                        *sink = fresh;
                        inner.redialing.store(false, Ordering::Release);
                        drop(sink);
                        info!(remote = %inner.remote, attempt, "remote connection restored");
                        return;
                    },
                    Ok(Err(e)) => {
                        debug!(remote = %inner.remote, attempt, error = %e, "redial failed");
                    },
                    Err(_) => {
                        debug!(remote = %inner.remote, attempt, "redial timed out");
                    },
                }
                tokio::time::sleep(REDIAL_PAUSE).await;
            }
        });
    }
}

async fn dial(remote: &str, tls: Option<&TlsClient>) -> std::io::Result<Sink> {
    let stream = TcpStream::connect(remote).await?;
    stream.set_nodelay(true)?;
    match tls {
        Some(client) => Ok(Sink::Tls(Box::new(client.handshake(stream).await?))),
        None => Ok(Sink::Tcp(stream)),
    }
}

//! Dummy datagram generator.
//!
//! A testing utility: sends UDP datagrams of a fixed size to an endpoint,
//! either zeroed or filled with shuffled random bytes, optionally pacing
//! itself with a fixed pause. Useful for exercising a relay route without
//! a real multicast source.

use std::net::SocketAddr;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::RngCore;
use tokio::net::UdpSocket;
use tracing::info;

/// Options for a feed run.
#[derive(Debug, Clone)]
pub struct FeedOptions {
    /// Send all-zero payloads instead of random ones.
    pub zero: bool,

    /// Payload size in bytes.
    pub size: usize,

    /// Number of datagrams to send; 0 sends forever.
    pub count: u64,

    /// Pause between datagrams.
    pub pause: Option<Duration>,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            zero: false,
            size: 1024,
            count: 0,
            pause: None,
        }
    }
}

/// Send dummy datagrams to `addr` until the configured count is reached.
///
/// # Errors
///
/// Returns an error if the endpoint cannot be resolved or a send fails.
pub async fn run(addr: &str, options: &FeedOptions) -> std::io::Result<()> {
    let target = tokio::net::lookup_host(addr)
        .await?
        .next()
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                format!("'{addr}' did not resolve"),
            )
        })?;

    let bind_addr: SocketAddr = if target.is_ipv4() {
        (std::net::Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let socket = UdpSocket::bind(bind_addr).await?;
    socket.connect(target).await?;

    let mut rng = rand::thread_rng();
    let mut payload = vec![0u8; options.size];
    if !options.zero {
        rng.fill_bytes(&mut payload);
    }

    info!(target = %target, size = options.size, count = options.count, "feeding");

    let mut sent: u64 = 0;
    while options.count == 0 || sent < options.count {
        if !options.zero {
            payload.shuffle(&mut rng);
        }
        socket.send(&payload).await?;
        sent += 1;

        if let Some(pause) = options.pause {
            tokio::time::sleep(pause).await;
        }
    }

    info!(sent, "feed finished");
    Ok(())
}

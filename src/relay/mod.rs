//! The relay: edge ingress.
//!
//! One worker per configured route reads datagrams from its local UDP
//! group and frames them onto the single shared connection to the remote
//! gateway. A worker that loses its UDP source dies alone; the remaining
//! workers and the shared connection keep running.

mod error;
mod subscriber;
mod worker;
mod writer;

pub use error::{RelayError, RelayResult};
pub use subscriber::Subscriber;
pub use worker::Worker;
pub use writer::RemoteWriter;

use tokio::task::JoinSet;
use tracing::{error, info};

use crate::config::RelayConfig;
use crate::pacing::{Bucket, PacingMode};
use crate::tls::TlsClient;

/// Run a relay from its configuration until every worker has terminated.
///
/// Dials the remote once, spawns one worker per route, and waits. Worker
/// failures are logged as they happen; the first one becomes the return
/// value once all workers are done.
///
/// # Errors
///
/// Returns startup errors (resolution, subscription, dial, TLS) directly,
/// and the first worker failure otherwise.
pub async fn run(config: RelayConfig) -> RelayResult<()> {
    config.validate()?;

    let tls = match &config.certificate {
        Some(certificate) => Some(TlsClient::new(certificate, &config.remote)?),
        None => None,
    };
    let writer = RemoteWriter::connect(&config.remote, tls).await?;
    info!(
        remote = %config.remote,
        routes = config.routes.len(),
        tls = config.certificate.is_some(),
        "relay connected"
    );

    let shared_bucket = config.pacing.as_ref().and_then(|pacing| {
        (pacing.mode == PacingMode::Shared)
            .then(|| Bucket::new(pacing.capacity, pacing.interval()))
    });

    let mut workers = JoinSet::new();
    for route in &config.routes {
        let tag = route.tag()?;
        let subscriber = Subscriber::bind(&route.ip, route.interface.as_deref()).await?;
        let bucket = config.pacing.as_ref().and_then(|pacing| match pacing.mode {
            PacingMode::Shared => shared_bucket.clone(),
            PacingMode::PerRoute => Some(Bucket::new(pacing.capacity, pacing.interval())),
        });
        workers.spawn(Worker::new(tag, subscriber, writer.clone(), bucket).run());
    }

    let mut first_error = None;
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(Ok(())) => {},
            Ok(Err(e)) => {
                error!(error = %e, "relay worker terminated");
                first_error.get_or_insert(e);
            },
            Err(e) => error!(error = %e, "relay worker panicked"),
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

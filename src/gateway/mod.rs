//! The gateway: edge egress.
//!
//! An acceptor takes relay connections (plain TCP or TLS) under a bounded
//! session cap; each session decodes the framed stream, verifies payload
//! checksums, and forwards payloads to the UDP destinations named by
//! their routing tags.

mod acceptor;
mod error;
mod routes;
mod session;

pub use acceptor::{Acceptor, DEFAULT_CLIENTS};
pub use error::{GatewayError, GatewayResult};
pub use routes::RouteTable;
pub use session::Session;

use crate::config::GatewayConfig;

/// Run a gateway from its configuration until the accept loop stops.
///
/// # Errors
///
/// Returns startup errors directly, and the accept failure that ended the
/// loop otherwise.
pub async fn run(config: GatewayConfig) -> GatewayResult<()> {
    Acceptor::bind(&config).await?.run().await
}

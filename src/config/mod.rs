//! Configuration loading for the relay and gateway commands.
//!
//! Both commands take one TOML file. A relay file names the `remote`
//! gateway endpoint, an optional `[certificate]` block, an optional
//! `[pacing]` block, and a `[[route]]` list of local UDP groups to
//! subscribe to. A gateway file names the `local` bind endpoint, a
//! `clients` cap, and the same certificate/route surface, with routes
//! naming the UDP destinations frames are forwarded to.
//!
//! All validation happens at load time; a configuration that loads is safe
//! to run.

mod error;
mod loader;
mod types;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_gateway, load_relay};
pub use types::{endpoint_port, GatewayConfig, RelayConfig, RouteConfig};

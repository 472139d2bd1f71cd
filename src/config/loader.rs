//! Configuration file loading.

use std::path::Path;

use super::error::{ConfigError, ConfigResult};
use super::types::{GatewayConfig, RelayConfig};

/// Load and validate a relay configuration file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the TOML is malformed, or
/// validation fails.
pub fn load_relay<P: AsRef<Path>>(path: P) -> ConfigResult<RelayConfig> {
    let config: RelayConfig = toml::from_str(&read(path.as_ref())?)?;
    config.validate()?;
    Ok(config)
}

/// Load and validate a gateway configuration file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the TOML is malformed, or
/// validation fails.
pub fn load_gateway<P: AsRef<Path>>(path: P) -> ConfigResult<GatewayConfig> {
    let config: GatewayConfig = toml::from_str(&read(path.as_ref())?)?;
    config.validate()?;
    Ok(config)
}

fn read(path: &Path) -> ConfigResult<String> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })
}

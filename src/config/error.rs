//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration-related errors. All of them abort startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read configuration file '{path}': {source}")]
    Read {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML content.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// No routes were configured.
    #[error("at least one [[route]] is required")]
    NoRoutes,

    /// A required endpoint is missing or empty.
    #[error("missing required endpoint: {field}")]
    MissingEndpoint {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A route has neither an explicit id nor a usable port to derive one.
    #[error("route '{addr}' has no id and no usable port to derive one from")]
    UnresolvableTag {
        /// The route's endpoint as configured.
        addr: String,
    },

    /// Two routes resolved to the same tag.
    #[error("duplicate routing tag {tag}")]
    DuplicateTag {
        /// The colliding tag.
        tag: u16,
    },

    /// The pacing block is unusable.
    #[error("invalid pacing configuration: {message}")]
    InvalidPacing {
        /// What is wrong with it.
        message: String,
    },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

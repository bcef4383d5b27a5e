//! Configuration errors.

use thiserror::Error;

/// Result type alias for probe and config construction.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while building a probe or loading configuration.
///
/// These are never produced by a running poll loop.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("invalid duration {value:?}: expected e.g. \"500ms\", \"30s\", \"10m\"")]
    Duration { value: String },

    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    /// A `Config/*.toml` file that is not valid TOML.
    #[error("Failed to parse global config `{0}`")]
    Global(String, #[source] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(String),
}

//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("failed to read configuration file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML or has unknown fields
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Environment override could not be interpreted
    #[error("invalid environment override: {0}")]
    Env(#[from] envy::Error),

    /// Field constraint violated
    #[error("configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Storage path is empty
    #[error("storage path must not be empty")]
    EmptyPath,
}

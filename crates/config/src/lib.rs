//! Configuration loading and validation for certvault storage
//!
//! Configuration comes from three layers, later layers winning:
//!
//! 1. built-in defaults (platform data directory, fsync on, owner-only modes)
//! 2. an optional TOML file with a `[storage]` table
//! 3. `CERTVAULT_STORAGE_*` environment variables
//!
//! # Example
//!
//! ```toml
//! [storage]
//! path = "/var/lib/certvault"
//! fsync = true
//! directory-mode = 0o700
//! certificate-mode = 0o644
//! ```

mod error;

pub use error::ConfigError;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::{Validate, ValidationError};

/// Prefix for environment overrides (`CERTVAULT_STORAGE_PATH`, `CERTVAULT_STORAGE_FSYNC`)
pub const ENV_PREFIX: &str = "CERTVAULT_STORAGE_";

/// Mode applied to private key material; not configurable
pub const KEY_FILE_MODE: u32 = 0o600;

/// Fallback storage location when no platform data directory is known
const FALLBACK_STORAGE_PATH: &str = "certvault-storage";

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct StorageConfig {
    /// Root directory of the repository
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,

    /// Flush file contents and directory entries to disk on every commit
    #[serde(default = "default_fsync")]
    pub fsync: bool,

    /// Mode for directories created by the repository
    #[serde(default = "default_directory_mode")]
    #[validate(custom(function = "validate_directory_mode"))]
    pub directory_mode: u32,

    /// Mode for certificates and distinguished names
    #[serde(default = "default_certificate_mode")]
    #[validate(custom(function = "validate_file_mode"))]
    pub certificate_mode: u32,
}

fn default_storage_path() -> PathBuf {
    directories::ProjectDirs::from("io", "certvault", "certvault")
        .map(|dirs| dirs.data_dir().join("storage"))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_STORAGE_PATH))
}

fn default_fsync() -> bool {
    true
}

fn default_directory_mode() -> u32 {
    0o700
}

fn default_certificate_mode() -> u32 {
    0o600
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            fsync: default_fsync(),
            directory_mode: default_directory_mode(),
            certificate_mode: default_certificate_mode(),
        }
    }
}

/// On-disk file layout
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    storage: StorageConfig,
}

/// Values read from the environment
#[derive(Debug, Default, Deserialize)]
struct EnvOverrides {
    path: Option<PathBuf>,
    fsync: Option<bool>,
}

impl StorageConfig {
    /// Storage configuration rooted at `path` with default settings
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Parse and validate a TOML document. Environment overrides are not applied.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        file.storage.check()?;
        Ok(file.storage)
    }

    /// Parse and validate a TOML file. Environment overrides are not applied.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        debug!(
            config_path = %path.display(),
            storage_path = %config.path.display(),
            "Loaded storage configuration"
        );
        Ok(config)
    }

    /// Load from an optional file, apply process environment overrides and validate
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.with_env_overrides(std::env::vars())?;
        config.check()?;
        Ok(config)
    }

    /// Apply `CERTVAULT_STORAGE_*` overrides from the given variables
    pub fn with_env_overrides<I>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let overrides: EnvOverrides = envy::prefixed(ENV_PREFIX).from_iter(vars)?;

        if let Some(path) = overrides.path {
            debug!(storage_path = %path.display(), "Storage path overridden from environment");
            self.path = path;
        }
        if let Some(fsync) = overrides.fsync {
            self.fsync = fsync;
        }

        Ok(self)
    }

    /// Validate field constraints
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        self.validate()?;
        Ok(())
    }

    /// Mode for files holding private key material
    pub fn key_mode(&self) -> u32 {
        KEY_FILE_MODE
    }
}

fn validate_file_mode(mode: u32) -> Result<(), ValidationError> {
    if mode & !0o777 != 0 {
        return Err(ValidationError::new("mode_out_of_range"));
    }
    if mode & 0o600 != 0o600 {
        return Err(ValidationError::new("owner_needs_read_write"));
    }
    if mode & 0o022 != 0 {
        return Err(ValidationError::new("group_or_other_writable"));
    }
    Ok(())
}

fn validate_directory_mode(mode: u32) -> Result<(), ValidationError> {
    validate_file_mode(mode)?;
    if mode & 0o100 == 0 {
        return Err(ValidationError::new("owner_needs_execute"));
    }
    Ok(())
}

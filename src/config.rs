//! Client configuration.
//!
//! Handles loading and validating an `imaginary.toml` file. Values are
//! layered: stock defaults, then the file, then the `IMAGINARY_URL`
//! environment variable for the service address.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! service_uri = ""            # Base URI of the imaginary service
//!
//! [storage]
//! backend = "tempfile"        # "tempfile" or "memory"
//! # temp_dir = "/var/tmp"     # Where temp files go (tempfile backend only)
//! ```
//!
//! Unknown keys are rejected to catch typos early. An empty `service_uri`
//! is accepted here; requests fail with a configuration error until it is
//! set.

use crate::resource::{AnyStore, MemoryStore, TempFileStore};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Environment variable that overrides `service_uri`.
pub const SERVICE_URI_ENV: &str = "IMAGINARY_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Client configuration loaded from `imaginary.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URI of the remote service, e.g. `http://localhost:9000`.
    pub service_uri: String,
    /// Where processed images are materialized.
    pub storage: StorageConfig,
}

impl ClientConfig {
    /// Validate config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let uri = self.service_uri.trim();
        if !uri.is_empty() && !(uri.starts_with("http://") || uri.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "service_uri must start with http:// or https://, got '{uri}'"
            )));
        }
        if self.storage.backend == StorageBackend::Memory && self.storage.temp_dir.is_some() {
            return Err(ConfigError::Validation(
                "storage.temp_dir only applies to the tempfile backend".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Tempfile,
    Memory,
}

/// Result storage settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for temp files. System temp dir when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<String>,
}

impl StorageConfig {
    /// The store these settings describe.
    pub fn store(&self) -> AnyStore {
        match (self.backend, &self.temp_dir) {
            (StorageBackend::Memory, _) => AnyStore::Memory(MemoryStore),
            (StorageBackend::Tempfile, Some(dir)) => AnyStore::TempFile(TempFileStore::in_dir(dir)),
            (StorageBackend::Tempfile, None) => AnyStore::TempFile(TempFileStore::new()),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ClientConfig::default())?)
}

/// Layer a config file over the stock defaults.
///
/// `[storage]` and any other table merge key by key, so a file that only sets
/// `storage.backend` keeps the default `temp_dir`. Scalars in the file
/// replace the default outright.
pub fn merge_toml(defaults: toml::Value, file: toml::Value) -> toml::Value {
    match (defaults, file) {
        (toml::Value::Table(mut settings), toml::Value::Table(overrides)) => {
            for (key, value) in overrides {
                let value = match settings.remove(&key) {
                    Some(default) => merge_toml(default, value),
                    None => value,
                };
                settings.insert(key, value);
            }
            toml::Value::Table(settings)
        }
        (_, file) => file,
    }
}

/// Read a config file as a raw TOML value; `Ok(None)` when it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Replace `service_uri` with the value of [`SERVICE_URI_ENV`] when `lookup`
/// yields a non-blank one.
pub fn apply_env(
    mut config: ClientConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ClientConfig {
    if let Some(uri) = lookup(SERVICE_URI_ENV).filter(|v| !v.trim().is_empty()) {
        config.service_uri = uri;
    }
    config
}

/// Load config from `path`, layered over stock defaults and under the
/// environment, then validate it.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match load_raw_config(path)? {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: ClientConfig = merged.try_into()?;
    let config = apply_env(config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

/// A commented stock `imaginary.toml`, printed by `imaginary gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# imaginary client configuration
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Base URI of the imaginary service. Requests fail until this is set.
# The IMAGINARY_URL environment variable overrides it.
service_uri = ""

[storage]
# Where processed images are kept after a pipeline run:
#   "tempfile" - a uniquely named temporary file (removed when released)
#   "memory"   - an in-memory buffer
backend = "tempfile"

# Directory for temporary files. Defaults to the system temp directory.
# temp_dir = "/var/tmp"
"##
}

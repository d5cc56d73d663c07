//! Storage and logging configuration parsed from environment variables.

use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = ".mkm-storage";
pub const DEFAULT_KEY_PREFIX: &str = "mkmsolutions-";
/// Typical per-origin `localStorage` allowance.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown MKM_STORAGE_BACKEND: {0}")]
    UnknownBackend(String),
    #[error("unknown MKM_LOG_LEVEL: {0}")]
    UnknownLogLevel(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
    Browser,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Memory => "memory",
            Self::File => "file",
            Self::Browser => "browser",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
    pub key_prefix: String,
    pub quota_bytes: usize,
    pub log_level: tracing::Level,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            quota_bytes: DEFAULT_QUOTA_BYTES,
            log_level: tracing::Level::INFO,
        }
    }
}

impl StorageConfig {
    /// Build typed storage config from environment variables.
    ///
    /// Optional:
    /// - `MKM_STORAGE_BACKEND`: `memory` (default), `file` or `browser`
    /// - `MKM_STORAGE_DIR`: file backend directory, default `.mkm-storage`
    /// - `MKM_STORAGE_KEY_PREFIX`: slot key prefix, default `mkmsolutions-`
    /// - `MKM_STORAGE_QUOTA_BYTES`: memory backend quota, default 5 MiB
    /// - `MKM_LOG_LEVEL`: `trace`, `debug`, `info` (default), `warn`, `error`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unknown backend or log level.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = parse_backend(std::env::var("MKM_STORAGE_BACKEND").ok().as_deref())?;
        let log_level = parse_log_level(std::env::var("MKM_LOG_LEVEL").ok().as_deref())?;
        let data_dir = std::env::var("MKM_STORAGE_DIR").map_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);
        let key_prefix = std::env::var("MKM_STORAGE_KEY_PREFIX").unwrap_or_else(|_| DEFAULT_KEY_PREFIX.to_string());
        let quota_bytes = env_parse("MKM_STORAGE_QUOTA_BYTES", DEFAULT_QUOTA_BYTES);

        Ok(Self { backend, data_dir, key_prefix, quota_bytes, log_level })
    }

    /// Full storage key for an entity slot, e.g. `mkmsolutions-clients`.
    #[must_use]
    pub fn slot_key(&self, slot: &str) -> String {
        format!("{}{slot}", self.key_prefix)
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_backend(raw: Option<&str>) -> Result<StorageBackend, ConfigError> {
    match raw.unwrap_or("memory").to_ascii_lowercase().as_str() {
        "memory" => Ok(StorageBackend::Memory),
        "file" => Ok(StorageBackend::File),
        "browser" => Ok(StorageBackend::Browser),
        other => Err(ConfigError::UnknownBackend(other.to_string())),
    }
}

fn parse_log_level(raw: Option<&str>) -> Result<tracing::Level, ConfigError> {
    match raw.unwrap_or("info").to_ascii_lowercase().as_str() {
        "trace" => Ok(tracing::Level::TRACE),
        "debug" => Ok(tracing::Level::DEBUG),
        "info" => Ok(tracing::Level::INFO),
        "warn" => Ok(tracing::Level::WARN),
        "error" => Ok(tracing::Level::ERROR),
        other => Err(ConfigError::UnknownLogLevel(other.to_string())),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

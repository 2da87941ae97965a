//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$COFFER_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/coffer/config.toml`
//! 3. `~/.coffer/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use coffer::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("Lock attempts: {}", config.retry_policy().attempts);
//! println!("Record user: {}", config.record_user());
//! ```

pub mod schema;

pub use schema::{EnvelopeConfig, GlobalConfig, LockConfig};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::lock::{RetryPolicy, DEFAULT_LOCK_ATTEMPTS, DEFAULT_LOCK_INTERVAL};

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Effective configuration.
///
/// Accessor methods apply defaults for anything left unset.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or holds
    /// invalid values. A missing config file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_global() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let global = Self::read_global_config(path)?;
        global.validate()?;
        Ok(Self {
            global,
            global_path: Some(path.to_path_buf()),
        })
    }

    /// Locate the first existing global config file.
    fn find_global() -> Option<PathBuf> {
        // 1. Check $COFFER_CONFIG
        if let Ok(path) = std::env::var("COFFER_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/coffer/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("coffer/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.coffer/config.toml
        dirs::home_dir()
            .map(|home| home.join(".coffer/config.toml"))
            .filter(|path| path.exists())
    }

    /// Read and parse a global config file.
    fn read_global_config(path: &Path) -> Result<GlobalConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Get the lock retry policy.
    ///
    /// Defaults to 3 attempts, 30ms apart.
    pub fn retry_policy(&self) -> RetryPolicy {
        let lock = self.global.lock.as_ref();
        let attempts = lock
            .and_then(|l| l.attempts)
            .unwrap_or(DEFAULT_LOCK_ATTEMPTS);
        let interval = lock
            .and_then(|l| l.interval_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_LOCK_INTERVAL);
        RetryPolicy::new(attempts, interval)
    }

    /// Check if written documents should record the acting user.
    ///
    /// Defaults to `true` if not configured.
    pub fn record_user(&self) -> bool {
        self.global
            .envelope
            .as_ref()
            .and_then(|e| e.record_user)
            .unwrap_or(true)
    }

    /// Get the path to the loaded global config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }
}

//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Config values are validated after parsing: a lock policy must make at
//! least one attempt and must not stall an interactive caller.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Longest accepted delay between lock attempts.
pub const MAX_INTERVAL_MS: u64 = 10_000;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// [lock]
/// attempts = 3
/// interval_ms = 30
///
/// [envelope]
/// record_user = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Lock acquisition policy
    pub lock: Option<LockConfig>,

    /// Envelope metadata settings
    pub envelope: Option<EnvelopeConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(lock) = &self.lock {
            lock.validate()?;
        }
        Ok(())
    }
}

/// Lock acquisition settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LockConfig {
    /// Total acquisition attempts (default: 3)
    pub attempts: Option<u32>,

    /// Delay between attempts in milliseconds (default: 30)
    pub interval_ms: Option<u64>,
}

impl LockConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attempts == Some(0) {
            return Err(ConfigError::InvalidValue(
                "lock.attempts must be at least 1".to_string(),
            ));
        }
        if let Some(ms) = self.interval_ms {
            if ms > MAX_INTERVAL_MS {
                return Err(ConfigError::InvalidValue(format!(
                    "lock.interval_ms {} exceeds maximum of {}",
                    ms, MAX_INTERVAL_MS
                )));
            }
        }
        Ok(())
    }
}

/// Envelope metadata settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EnvelopeConfig {
    /// Record the acting user in written documents (default: true)
    pub record_user: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let config: GlobalConfig = toml::from_str(
            r#"
            [lock]
            attempts = 5
            interval_ms = 10

            [envelope]
            record_user = false
            "#,
        )
        .unwrap();

        let lock = config.lock.as_ref().unwrap();
        assert_eq!(lock.attempts, Some(5));
        assert_eq!(lock.interval_ms, Some(10));
        assert_eq!(config.envelope.unwrap().record_user, Some(false));
    }

    #[test]
    fn zero_attempts_rejected() {
        let lock = LockConfig {
            attempts: Some(0),
            ..Default::default()
        };
        assert!(lock.validate().is_err());
    }

    #[test]
    fn long_interval_rejected() {
        let lock = LockConfig {
            interval_ms: Some(MAX_INTERVAL_MS + 1),
            ..Default::default()
        };
        assert!(lock.validate().is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<GlobalConfig, _> = toml::from_str("[cache]\nsize = 1\n");
        assert!(result.is_err());
    }
}

//! # Runtime Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! document is a valid configuration.
//!
//! ```toml
//! [pool]
//! preload = 64
//!
//! [executor]
//! drain_budget = 4096
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// Default number of request objects allocated by `RequestPool::start`.
pub const DEFAULT_PRELOAD: usize = 10;

/// Upper bound on `preload`, to catch unit mistakes in config files.
pub const MAX_PRELOAD: usize = 1 << 20;

/// Request pool settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    /// Requests allocated up front when the pool starts.
    pub preload: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            preload: DEFAULT_PRELOAD,
        }
    }
}

/// Execution-side drain settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutorConfig {
    /// Maximum requests applied per `drain` call. Zero means no limit.
    pub drain_budget: usize,
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TandemConfig {
    /// Pool settings.
    pub pool: PoolConfig,
    /// Executor settings.
    pub executor: ExecutorConfig,
}

impl TandemConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed input, [`ConfigError::Invalid`]
    /// for out-of-range values.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`TandemConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.pool.preload > MAX_PRELOAD {
            return Err(ConfigError::Invalid(format!(
                "pool.preload = {} exceeds the maximum of {MAX_PRELOAD}",
                self.pool.preload
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = TandemConfig::from_toml_str("").unwrap();
        assert_eq!(config, TandemConfig::default());
        assert_eq!(config.pool.preload, DEFAULT_PRELOAD);
        assert_eq!(config.executor.drain_budget, 0);
    }

    #[test]
    fn test_partial_document() {
        let config = TandemConfig::from_toml_str("[executor]\ndrain_budget = 128\n").unwrap();
        assert_eq!(config.pool.preload, DEFAULT_PRELOAD);
        assert_eq!(config.executor.drain_budget, 128);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = TandemConfig::from_toml_str("[pool]\nprelaod = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_oversized_preload_rejected() {
        let err = TandemConfig::from_toml_str("[pool]\npreload = 99999999\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = TandemConfig::load("/nonexistent/tandem.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

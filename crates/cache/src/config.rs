//! Cache configuration with environment overrides and validation

use crate::errors::{CacheError, Result};
use filecache_utils::parse_duration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default minimum spacing between trims
pub const DEFAULT_TRIM_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default maximum age of an entry
pub const DEFAULT_TRIM_LIMIT: Duration = Duration::from_secs(24 * 60 * 60);

/// Eviction settings for a cache directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Minimum spacing between two trims
    pub trim_interval: Duration,
    /// Files older than this are always removed
    pub trim_limit: Duration,
    /// Files larger than this are removed once older than `trim_interval`.
    /// Zero disables the size rule.
    pub trim_size: u64,
    /// Hard ceiling on retained bytes. Zero disables the ceiling.
    pub max_size: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            trim_interval: DEFAULT_TRIM_INTERVAL,
            trim_limit: DEFAULT_TRIM_LIMIT,
            trim_size: 0,
            max_size: 0,
        }
    }
}

impl CacheConfig {
    /// Defaults overlaid with any `FILECACHE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Overlay `FILECACHE_TRIM_INTERVAL`, `FILECACHE_TRIM_LIMIT`,
    /// `FILECACHE_TRIM_SIZE` and `FILECACHE_MAX_SIZE` onto this config
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(value) = env_value("FILECACHE_TRIM_INTERVAL") {
            self.trim_interval = parse_duration(&value)?;
        }
        if let Some(value) = env_value("FILECACHE_TRIM_LIMIT") {
            self.trim_limit = parse_duration(&value)?;
        }
        if let Some(value) = env_value("FILECACHE_TRIM_SIZE") {
            self.trim_size = parse_size("FILECACHE_TRIM_SIZE", &value)?;
        }
        if let Some(value) = env_value("FILECACHE_MAX_SIZE") {
            self.max_size = parse_size("FILECACHE_MAX_SIZE", &value)?;
        }
        Ok(self)
    }

    /// Reject settings that cannot describe a working cache
    pub fn validate(&self) -> Result<()> {
        if self.trim_limit.is_zero() {
            return Err(CacheError::configuration(
                "trim limit must be greater than zero",
            ));
        }
        if self.max_size > 0 && self.trim_size > self.max_size {
            return Err(CacheError::configuration(format!(
                "max size ({}) must not be smaller than trim size ({})",
                self.max_size, self.trim_size
            )));
        }
        Ok(())
    }
}

/// Default cache directory: `FILECACHE_DIR`, else `<user cache dir>/filecache`
pub fn default_cache_dir() -> Result<PathBuf> {
    if let Some(dir) = env_value("FILECACHE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::cache_dir()
        .map(|dir| dir.join("filecache"))
        .ok_or_else(|| CacheError::configuration("could not determine the user cache directory"))
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_size(name: &str, value: &str) -> Result<u64> {
    value.parse::<u64>().map_err(|e| {
        CacheError::configuration(format!("{name}: invalid byte size '{value}': {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 4] = [
        "FILECACHE_TRIM_INTERVAL",
        "FILECACHE_TRIM_LIMIT",
        "FILECACHE_TRIM_SIZE",
        "FILECACHE_MAX_SIZE",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        let config = CacheConfig::from_env().unwrap();
        assert_eq!(config, CacheConfig::default());
        assert_eq!(config.trim_interval, Duration::from_secs(300));
        assert_eq!(config.trim_limit, Duration::from_secs(86_400));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        std::env::set_var("FILECACHE_TRIM_INTERVAL", "15m");
        std::env::set_var("FILECACHE_TRIM_LIMIT", "2d");
        std::env::set_var("FILECACHE_TRIM_SIZE", "1048576");
        std::env::set_var("FILECACHE_MAX_SIZE", "1073741824");

        let config = CacheConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.trim_interval, Duration::from_secs(900));
        assert_eq!(config.trim_limit, Duration::from_secs(172_800));
        assert_eq!(config.trim_size, 1 << 20);
        assert_eq!(config.max_size, 1 << 30);
    }

    #[test]
    #[serial]
    fn test_invalid_env_is_configuration_error() {
        clear_env();
        std::env::set_var("FILECACHE_MAX_SIZE", "lots");
        let result = CacheConfig::from_env();
        clear_env();

        assert!(matches!(result, Err(CacheError::Configuration { .. })));
    }

    #[test]
    fn test_validate() {
        assert!(CacheConfig::default().validate().is_ok());

        let zero_limit = CacheConfig {
            trim_limit: Duration::ZERO,
            ..CacheConfig::default()
        };
        assert!(zero_limit.validate().is_err());

        let inverted = CacheConfig {
            trim_size: 2048,
            max_size: 1024,
            ..CacheConfig::default()
        };
        assert!(inverted.validate().is_err());
    }
}

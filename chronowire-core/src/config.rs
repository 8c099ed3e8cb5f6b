//! Configuration types

use crate::{ConfigError, DriverError, DriverResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether handles memoize the default zone between executions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZoneCacheMode {
    /// Cache unless the provider reports fast lookups.
    #[default]
    Auto,
    /// Never cache; every implicit operation asks the provider.
    Disabled,
}

impl ZoneCacheMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneCacheMode::Auto => "auto",
            ZoneCacheMode::Disabled => "disabled",
        }
    }
}

impl fmt::Display for ZoneCacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoneCacheMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(ZoneCacheMode::Auto),
            "disabled" | "off" => Ok(ZoneCacheMode::Disabled),
            other => Err(ConfigError::InvalidValue {
                field: "zone_cache".to_string(),
                value: other.to_string(),
                reason: "expected 'auto' or 'disabled'".to_string(),
            }),
        }
    }
}

/// Driver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    pub zone_cache: ZoneCacheMode,
    /// Parameter sets per execute request when flushing a batch.
    pub max_batch_size: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            zone_cache: ZoneCacheMode::Auto,
            max_batch_size: 128,
        }
    }
}

impl DriverConfig {
    pub fn with_zone_cache(mut self, mode: ZoneCacheMode) -> Self {
        self.zone_cache = mode;
        self
    }

    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    /// Validate the configuration.
    /// Returns Ok(()) if valid, Err(DriverError::Config) if invalid.
    pub fn validate(&self) -> DriverResult<()> {
        if self.max_batch_size == 0 {
            return Err(DriverError::Config(ConfigError::InvalidValue {
                field: "max_batch_size".to_string(),
                value: self.max_batch_size.to_string(),
                reason: "max_batch_size must be greater than 0".to_string(),
            }));
        }
        Ok(())
    }

    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `CHRONOWIRE_ZONE_CACHE`: `auto` or `disabled` (default: auto)
    /// - `CHRONOWIRE_MAX_BATCH_SIZE`: parameter sets per request (default: 128)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            zone_cache: std::env::var("CHRONOWIRE_ZONE_CACHE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.zone_cache),
            max_batch_size: std::env::var("CHRONOWIRE_MAX_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_batch_size),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DriverConfig::default();
        assert_eq!(config.zone_cache, ZoneCacheMode::Auto);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = DriverConfig::default().with_max_batch_size(0);
        let err = config.validate().unwrap_err();
        match err {
            DriverError::Config(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "max_batch_size");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_zone_cache_mode_parse() {
        assert_eq!("AUTO".parse::<ZoneCacheMode>().unwrap(), ZoneCacheMode::Auto);
        assert_eq!(
            " disabled ".parse::<ZoneCacheMode>().unwrap(),
            ZoneCacheMode::Disabled
        );
        assert!("sometimes".parse::<ZoneCacheMode>().is_err());
    }
}

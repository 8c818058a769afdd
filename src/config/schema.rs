//! Configuration schema definitions.
//!
//! This module defines the structure of the served-ports configuration files.
//! Every field is optional in a file; unset fields keep the value from the
//! previous layer of the hierarchy (see [`ConfigLoader`](super::ConfigLoader)).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::error::ConfigError;
use crate::portmon::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_REFRESH_INTERVAL, PROC_NET_DIR};

/// Top-level configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Polling observer settings.
    #[serde(default)]
    pub observer: ObserverConfig,
}

impl Config {
    /// Built-in defaults, the bottom layer of the hierarchy.
    pub fn defaults() -> Self {
        Self {
            general: GeneralConfig {
                log_level: "warn".to_string(),
            },
            observer: ObserverConfig {
                refresh_interval_ms: Some(DEFAULT_REFRESH_INTERVAL.as_millis() as u64),
                channel_capacity: Some(DEFAULT_CHANNEL_CAPACITY),
                proc_net_dir: Some(PathBuf::from(PROC_NET_DIR)),
            },
        }
    }

    /// Merge another config into this one.
    ///
    /// Values set in `other` override values in `self`.
    pub fn merge(&mut self, other: Config) {
        self.general.merge(other.general);
        self.observer.merge(other.observer);
    }

    /// Check that the merged configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.observer.validate()
    }

    /// Render the configuration as a TOML document.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// General application settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default)]
    pub log_level: String,
}

impl GeneralConfig {
    fn merge(&mut self, other: GeneralConfig) {
        if !other.log_level.is_empty() {
            self.log_level = other.log_level;
        }
    }
}

/// Polling observer configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ObserverConfig {
    /// Time between two polls, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval_ms: Option<u64>,

    /// Capacity of the update and error channels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_capacity: Option<usize>,

    /// Directory holding the `tcp` and `tcp6` tables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proc_net_dir: Option<PathBuf>,
}

impl ObserverConfig {
    fn merge(&mut self, other: ObserverConfig) {
        if other.refresh_interval_ms.is_some() {
            self.refresh_interval_ms = other.refresh_interval_ms;
        }
        if other.channel_capacity.is_some() {
            self.channel_capacity = other.channel_capacity;
        }
        if other.proc_net_dir.is_some() {
            self.proc_net_dir = other.proc_net_dir;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "observer.refresh_interval_ms".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.channel_capacity == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "observer.channel_capacity".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Effective refresh interval.
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_REFRESH_INTERVAL)
    }

    /// Effective channel capacity.
    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity.unwrap_or(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Effective socket table directory.
    pub fn proc_net_dir(&self) -> PathBuf {
        self.proc_net_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(PROC_NET_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_empty() {
        let config = Config::default();
        assert!(config.general.log_level.is_empty());
        assert!(config.observer.refresh_interval_ms.is_none());
        assert!(config.observer.proc_net_dir.is_none());
    }

    #[test]
    fn test_builtin_defaults() {
        let config = Config::defaults();
        assert_eq!(config.observer.refresh_interval(), Duration::from_secs(1));
        assert_eq!(config.observer.channel_capacity(), 1);
        assert_eq!(config.observer.proc_net_dir(), PathBuf::from("/proc/net"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_merge_overrides_set_values_only() {
        let mut base = Config::defaults();
        let other = Config {
            general: GeneralConfig::default(),
            observer: ObserverConfig {
                refresh_interval_ms: Some(250),
                ..Default::default()
            },
        };

        base.merge(other);

        assert_eq!(base.observer.refresh_interval_ms, Some(250));
        assert_eq!(base.observer.channel_capacity, Some(1));
        assert_eq!(base.general.log_level, "warn");
    }

    #[test]
    fn test_config_deserialize() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [observer]
            refresh_interval_ms = 500
            channel_capacity = 8
            proc_net_dir = "/proc/1234/net"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.observer.refresh_interval(), Duration::from_millis(500));
        assert_eq!(config.observer.channel_capacity(), 8);
        assert_eq!(config.observer.proc_net_dir(), PathBuf::from("/proc/1234/net"));
    }

    #[test]
    fn test_config_serialize_skips_unset() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(!toml_str.contains("refresh_interval_ms"));
    }

    #[test]
    fn test_to_toml_reparses() {
        let config = Config::defaults();
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[observer]"));

        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_zero_values_are_invalid() {
        let mut config = Config::defaults();
        config.observer.refresh_interval_ms = Some(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "observer.refresh_interval_ms"
        ));

        let mut config = Config::defaults();
        config.observer.channel_capacity = Some(0);
        assert!(config.validate().is_err());
    }
}

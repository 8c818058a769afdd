//! Configuration system for served-ports.
//!
//! This module provides TOML configuration loading with hierarchy merging.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded from multiple sources and merged in order:
//!
//! 1. Built-in defaults
//! 2. System config: `/etc/served-ports/config.toml`
//! 3. User config: `~/.config/served-ports/config.toml`
//! 4. Additional config file (via `--config` flag)
//! 5. CLI flags (highest priority)
//!
//! Missing system and user files are skipped. Values set in a later layer
//! override earlier ones; unset values are inherited.
//!
//! ```toml
//! [general]
//! log_level = "info"
//!
//! [observer]
//! refresh_interval_ms = 1000
//! channel_capacity = 1
//! proc_net_dir = "/proc/net"
//! ```

mod error;
mod loader;
mod schema;

pub use error::ConfigError;
pub use loader::{ConfigLoader, SYSTEM_CONFIG_PATH};
pub use schema::{Config, GeneralConfig, ObserverConfig};

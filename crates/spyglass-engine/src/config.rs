//! Engine configuration
//!
//! Loads settings from TOML: per-source base URLs, the global-ledger
//! opt-in flag, component-poll bounds, result and time-window limits, and
//! the projection cache TTL.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Engine configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A field value fails validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Engine configuration loaded from TOML.
///
/// Every knob has a conservative default; a config file only needs the
/// endpoints it wants to enable.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Ledger mirror base URL
    #[serde(default)]
    pub mirror_url: Option<String>,

    /// Live component base URL
    #[serde(default)]
    pub component_url: Option<String>,

    /// Identifier of the polled component (rate-limit key, report label)
    #[serde(default = "default_component_id")]
    pub component_id: String,

    /// Artifact-pointer index base URL
    #[serde(default)]
    pub depot_url: Option<String>,

    /// Authoritative global ledger base URL
    #[serde(default)]
    pub global_ledger_url: Option<String>,

    /// Explicit opt-in for global ledger access (default: off)
    #[serde(default)]
    pub allow_global_ledger: bool,

    /// Component poll budget per trailing minute
    #[serde(default = "default_poll_rate_limit")]
    pub component_poll_rate_limit_per_minute: u32,

    /// Component poll timeout in milliseconds
    #[serde(default = "default_poll_timeout_ms")]
    pub component_poll_timeout_ms: u64,

    /// How long a poll result is reused, in seconds
    #[serde(default = "default_poll_cache_seconds")]
    pub component_poll_cache_seconds: u64,

    /// Result limit applied when the caller does not request one
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    /// Hard ceiling on any result limit
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,

    /// Time window applied when the caller does not request one, in hours
    #[serde(default = "default_time_window_hours")]
    pub default_time_window_hours: u32,

    /// Hard ceiling on any time window, in hours
    #[serde(default = "default_max_time_window_hours")]
    pub max_time_window_hours: u32,

    /// Projection cache TTL in seconds
    #[serde(default = "default_cache_ttl_seconds")]
    pub projection_cache_ttl_seconds: u64,
}

fn default_component_id() -> String {
    "gate".to_string()
}

fn default_poll_rate_limit() -> u32 {
    60
}

fn default_poll_timeout_ms() -> u64 {
    500
}

fn default_poll_cache_seconds() -> u64 {
    5
}

fn default_limit() -> u32 {
    100
}

fn default_max_limit() -> u32 {
    200
}

fn default_time_window_hours() -> u32 {
    24
}

fn default_max_time_window_hours() -> u32 {
    168
}

fn default_cache_ttl_seconds() -> u64 {
    60
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mirror_url: None,
            component_url: None,
            component_id: default_component_id(),
            depot_url: None,
            global_ledger_url: None,
            allow_global_ledger: false,
            component_poll_rate_limit_per_minute: default_poll_rate_limit(),
            component_poll_timeout_ms: default_poll_timeout_ms(),
            component_poll_cache_seconds: default_poll_cache_seconds(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            default_time_window_hours: default_time_window_hours(),
            max_time_window_hours: default_max_time_window_hours(),
            projection_cache_ttl_seconds: default_cache_ttl_seconds(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, url) in [
            ("mirror_url", &self.mirror_url),
            ("component_url", &self.component_url),
            ("depot_url", &self.depot_url),
            ("global_ledger_url", &self.global_ledger_url),
        ] {
            if let Some(url) = url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(ConfigError::Invalid(format!(
                        "{} must start with http:// or https://, got {}",
                        name, url
                    )));
                }
            }
        }

        if self.max_limit == 0 {
            return Err(ConfigError::Invalid("max_limit must be at least 1".to_string()));
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(ConfigError::Invalid(format!(
                "default_limit must be in 1..={}, got {}",
                self.max_limit, self.default_limit
            )));
        }
        if self.max_time_window_hours == 0 {
            return Err(ConfigError::Invalid(
                "max_time_window_hours must be at least 1".to_string(),
            ));
        }
        if self.component_poll_rate_limit_per_minute == 0 {
            return Err(ConfigError::Invalid(
                "component_poll_rate_limit_per_minute must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Create a default configuration for testing.
    pub fn default_test_config() -> Self {
        Self::default()
    }
}

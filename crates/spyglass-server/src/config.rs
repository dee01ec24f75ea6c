//! Configuration file parsing for the HTTP server.
//!
//! Loads settings from TOML: bind address, API key, and the nested
//! `[engine]` table consumed by the source manager.

use serde::Deserialize;
use spyglass_engine::EngineConfig;
use std::path::Path;
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Engine table failed validation
    #[error(transparent)]
    Engine(#[from] spyglass_engine::ConfigError),

    /// A field value fails validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bind port (e.g., 7400)
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// API key clients must present (Bearer or X-API-Key header)
    #[serde(default)]
    pub api_key: String,

    /// Accept unauthenticated requests (local development only)
    #[serde(default)]
    pub allow_insecure_dev: bool,

    /// Instance identifier reported by the liveness endpoint
    #[serde(default = "default_instance_id")]
    pub instance_id: String,

    /// Engine configuration
    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_port() -> u16 {
    7400
}

fn default_instance_id() -> String {
    format!("spyglass-{}", uuid::Uuid::now_v7())
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;

        if self.api_key.is_empty() && !self.allow_insecure_dev {
            return Err(ConfigError::Invalid(
                "api_key is required unless allow_insecure_dev = true".to_string(),
            ));
        }

        Ok(())
    }

    /// Create a default configuration for testing
    pub fn default_test_config() -> Self {
        ServerConfig {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
            api_key: String::new(),
            allow_insecure_dev: true,
            instance_id: "spyglass-test".to_string(),
            engine: EngineConfig::default_test_config(),
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_test_config() {
        let config = ServerConfig::default_test_config();
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.bind_port, 7400);
        assert!(config.allow_insecure_dev);
        config.validate().unwrap();
    }

    #[test]
    fn test_bind_addr() {
        let config = ServerConfig::default_test_config();
        assert_eq!(config.bind_addr(), "127.0.0.1:7400");
    }

    #[test]
    fn test_parse_toml_with_engine_table() {
        let toml = r#"
            bind_address = "0.0.0.0"
            bind_port = 9000
            api_key = "sg_test_key"

            [engine]
            mirror_url = "http://localhost:7100"
            allow_global_ledger = false
        "#;

        let config: ServerConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.bind_port, 9000);
        assert_eq!(config.api_key, "sg_test_key");
        assert_eq!(
            config.engine.mirror_url.as_deref(),
            Some("http://localhost:7100")
        );
        assert_eq!(config.engine.max_limit, 200);
    }

    #[test]
    fn test_missing_api_key_rejected_outside_dev() {
        let config: ServerConfig = toml::from_str("bind_port = 9000").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_from_file_rejects_bad_engine_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "allow_insecure_dev = true\n[engine]\nmirror_url = \"not-a-url\""
        )
        .unwrap();

        assert!(ServerConfig::from_file(file.path()).is_err());
    }
}

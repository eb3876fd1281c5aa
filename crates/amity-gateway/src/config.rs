//! Configuration file parsing for the Gateway.
//!
//! Loads settings from TOML files including bind address, JWT secret,
//! token expiry, database location and rate limits.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Gateway configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// Field present but unusable
    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

/// Gateway configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8080)
    pub bind_port: u16,

    /// Secret shared with the identity provider for verifying bearer tokens
    pub jwt_secret: String,

    /// Lifetime of tokens issued by this process, in seconds (default: 3600)
    #[serde(default = "default_token_expiry")]
    pub token_expiry_secs: u64,

    /// SQLite database file (default: "amity.db")
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Friend-request rate limit
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Per-user limit on sent friend requests
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per window (default: 20)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds (default: 60)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Users whose windows are held at once (default: 10000)
    #[serde(default = "default_max_tracked_users")]
    pub max_tracked_users: usize,
}

impl RateLimitConfig {
    /// Window length as a Duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            max_tracked_users: default_max_tracked_users(),
        }
    }
}

/// Default token expiry: 1 hour
fn default_token_expiry() -> u64 {
    3600
}

fn default_database_path() -> String {
    "amity.db".to_string()
}

fn default_max_requests() -> u32 {
    20
}

fn default_window_secs() -> u64 {
    60
}

fn default_max_tracked_users() -> usize {
    crate::rate_limit::DEFAULT_MAX_TRACKED_USERS
}

impl GatewayConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: GatewayConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingField("jwt_secret".to_string()));
        }
        if self.rate_limit.max_requests == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.max_requests must be at least 1".to_string(),
            ));
        }
        if self.rate_limit.window_secs == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.window_secs must be at least 1".to_string(),
            ));
        }
        if self.rate_limit.max_tracked_users == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.max_tracked_users must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a default configuration for testing
    pub fn default_test_config() -> Self {
        GatewayConfig {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8080,
            jwt_secret: "test-secret-key-do-not-use-in-production".to_string(),
            token_expiry_secs: 3600,
            database_path: ":memory:".to_string(),
            rate_limit: RateLimitConfig::default(),
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

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default_test_config();
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.bind_port, 8080);
        assert_eq!(config.token_expiry_secs, 3600);
        assert_eq!(config.database_path, ":memory:");
        assert_eq!(config.rate_limit.max_requests, 20);
    }

    #[test]
    fn test_bind_addr() {
        let config = GatewayConfig::default_test_config();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            bind_address = "0.0.0.0"
            bind_port = 9000
            jwt_secret = "my-secret"
            token_expiry_secs = 7200
            database_path = "/var/lib/amity/amity.db"

            [rate_limit]
            max_requests = 5
            window_secs = 30
            max_tracked_users = 500
        "#;

        let config = GatewayConfig::from_toml(toml).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.bind_port, 9000);
        assert_eq!(config.jwt_secret, "my-secret");
        assert_eq!(config.token_expiry_secs, 7200);
        assert_eq!(config.database_path, "/var/lib/amity/amity.db");
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.rate_limit.window(), Duration::from_secs(30));
        assert_eq!(config.rate_limit.max_tracked_users, 500);
    }

    #[test]
    fn test_defaults_applied() {
        let toml = r#"
            bind_address = "127.0.0.1"
            bind_port = 8080
            jwt_secret = "secret"
        "#;

        let config = GatewayConfig::from_toml(toml).unwrap();
        assert_eq!(config.token_expiry_secs, 3600);
        assert_eq!(config.database_path, "amity.db");
        assert_eq!(config.rate_limit.max_requests, 20);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.rate_limit.max_tracked_users, 10_000);
    }

    #[test]
    fn test_empty_secret_rejected() {
        let toml = r#"
            bind_address = "127.0.0.1"
            bind_port = 8080
            jwt_secret = ""
        "#;

        assert!(matches!(
            GatewayConfig::from_toml(toml),
            Err(ConfigError::MissingField(field)) if field == "jwt_secret"
        ));
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let toml = r#"
            bind_address = "127.0.0.1"
            bind_port = 8080
            jwt_secret = "secret"

            [rate_limit]
            max_requests = 0
        "#;

        assert!(matches!(
            GatewayConfig::from_toml(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_zero_tracked_users_rejected() {
        let toml = r#"
            bind_address = "127.0.0.1"
            bind_port = 8080
            jwt_secret = "secret"

            [rate_limit]
            max_tracked_users = 0
        "#;

        assert!(matches!(
            GatewayConfig::from_toml(toml),
            Err(ConfigError::Invalid(msg)) if msg.contains("max_tracked_users")
        ));
    }
}

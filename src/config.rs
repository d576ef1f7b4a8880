//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - vapor.toml (default configuration)
//! - vapor.local.toml (git-ignored local overrides)
//! - Environment variables (VAPOR_* prefix)
//!
//! ## Example
//!
//! ```toml
//! # vapor.toml
//! [database]
//! host = "db.internal"
//! database = "vapor"
//! username = "store"
//! password = "hunter2"
//!
//! [http]
//! port = 9090
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! VAPOR_DATABASE__HOST=10.0.0.5
//! VAPOR_DATABASE__CONNECT_TIMEOUT_SECS=5
//! ```

use std::fmt;
use std::path::Path;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Database connection settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    /// Database name
    #[serde(default = "default_db_name")]
    pub database: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Seconds to wait for the server before giving up
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// TLS mode (disable, allow, prefer, require, verify-ca, verify-full)
    #[serde(default = "default_ssl")]
    pub ssl: String,
}

impl DatabaseConfig {
    /// Check that the credentials needed to connect are present
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingField("database.host"));
        }
        if self.database.trim().is_empty() {
            return Err(ConfigError::MissingField("database.database"));
        }
        if self.username.trim().is_empty() {
            return Err(ConfigError::MissingField("database.username"));
        }
        if self.password.is_empty() {
            return Err(ConfigError::MissingField("database.password"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "database.connect_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// `host:port/database`, for messages and logs
    pub fn address(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("ssl", &self.ssl)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// HTTP front end configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Bind address
    #[serde(default = "default_http_host")]
    pub host: String,

    #[serde(default = "default_http_port")]
    pub port: u16,

    /// Allowed CORS origins (empty = same-origin only, unless cors_allow_all is true)
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Explicitly allow all CORS origins (dev mode opt-in)
    #[serde(default)]
    pub cors_allow_all: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            host: default_db_host(),
            port: default_db_port(),
            database: default_db_name(),
            username: String::new(),
            password: String::new(),
            connect_timeout_secs: default_connect_timeout_secs(),
            ssl: default_ssl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            host: default_http_host(),
            port: default_http_port(),
            cors_origins: Vec::new(),
            cors_allow_all: false,
        }
    }
}

// Default value functions
fn default_db_host() -> String {
    "127.0.0.1".to_string()
}
fn default_db_port() -> u16 {
    5432
}
fn default_db_name() -> String {
    "vapor".to_string()
}
fn default_connect_timeout_secs() -> u64 {
    30
}
fn default_ssl() -> String {
    "prefer".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}
fn default_http_host() -> String {
    "127.0.0.1".to_string()
}
fn default_http_port() -> u16 {
    8080
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Merges in order:
    /// 1. vapor.toml (base configuration)
    /// 2. vapor.local.toml (local overrides, git-ignored)
    /// 3. Environment variables (VAPOR_*)
    ///
    /// Missing files are skipped.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Figment::new()
            .merge(Toml::file("vapor.toml"))
            .merge(Toml::file("vapor.local.toml"))
            .merge(Env::prefixed("VAPOR_").split("__"))
            .extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file, then apply environment
    /// overrides. The file must exist.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let config = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("VAPOR_").split("__"))
            .extract()?;
        Ok(config)
    }

    /// `from_file` when a path is given, `load` otherwise
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::load(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.host, "127.0.0.1");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.database, "vapor");
        assert_eq!(config.database.connect_timeout_secs, 30);
        assert_eq!(config.database.ssl, "prefer");
    }

    #[test]
    fn test_default_logging_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn test_default_http_config() {
        let config = Config::default();
        assert_eq!(config.http.host, "127.0.0.1");
        assert_eq!(config.http.port, 8080);
        assert!(config.http.cors_origins.is_empty());
        assert!(!config.http.cors_allow_all);
    }

    #[test]
    fn test_validate_requires_credentials() {
        let mut db = DatabaseConfig::default();
        assert!(matches!(
            db.validate(),
            Err(ConfigError::MissingField("database.username"))
        ));
        db.username = "store".to_string();
        assert!(matches!(
            db.validate(),
            Err(ConfigError::MissingField("database.password"))
        ));
        db.password = "pw".to_string();
        assert!(db.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let db = DatabaseConfig {
            username: "store".to_string(),
            password: "pw".to_string(),
            connect_timeout_secs: 0,
            ..DatabaseConfig::default()
        };
        assert!(matches!(db.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_debug_redacts_password() {
        let db = DatabaseConfig {
            password: "hunter2".to_string(),
            ..DatabaseConfig::default()
        };
        let debug = format!("{db:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_unknown_section_key_rejected() {
        let result: Result<Config, _> = toml::from_str("[database]\nhots = \"typo\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_address() {
        assert_eq!(DatabaseConfig::default().address(), "127.0.0.1:5432/vapor");
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("[http]"));
        let back: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.database.port, 5432);
        assert_eq!(back.logging.level, "info");
        assert_eq!(back.http.port, 8080);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let back: Config = toml::from_str("[database]\nusername = \"store\"\n").unwrap();
        assert_eq!(back.database.username, "store");
        assert_eq!(back.database.host, "127.0.0.1");
        assert_eq!(back.http.port, 8080);
    }
}

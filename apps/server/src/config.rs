//! # Server Configuration
//!
//! Where the server listens, which database file it opens and how loudly it
//! logs. Store settings (name, currency, thresholds) are not here; they live
//! in the database and are edited through the API.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     MINIMARKET_BIND_ADDR=127.0.0.1                                     │
//! │     MINIMARKET_PORT=8080                                               │
//! │     MINIMARKET_DB_PATH=/var/lib/minimarket/minimarket.db               │
//! │     MINIMARKET_LOG=info,minimarket=debug                               │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/minimarket/server.toml (Linux)                           │
//! │     ~/Library/Application Support/com.minimarket.server/server.toml    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [http]
//! bind_addr = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! path = "/var/lib/minimarket/minimarket.db"
//! max_connections = 5
//!
//! [logging]
//! filter = "info,minimarket=debug,sqlx=warn"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

/// Default log filter when neither `RUST_LOG` nor config sets one.
pub const DEFAULT_LOG_FILTER: &str = "info,minimarket=debug,sqlx=warn";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

impl HttpSettings {
    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to `minimarket.db` in the platform data dir.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive. `RUST_LOG` still wins when set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub http: HttpSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl ServerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`server.toml`, or `config_path` when given)
    /// 3. Environment variables
    ///
    /// Runs before logging is initialised, so file lookups are traced at
    /// debug level only.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading server config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.http.bind_addr.trim().is_empty() {
            return Err(ConfigError::Invalid("http.bind_addr must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if let Some(path) = &self.database.path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("database.path must not be empty".into()));
            }
        }

        Ok(())
    }

    /// Applies `MINIMARKET_*` overrides read through `var`.
    fn apply_env_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = var("MINIMARKET_BIND_ADDR") {
            debug!(bind_addr = %addr, "Overriding bind address from environment");
            self.http.bind_addr = addr;
        }

        if let Some(port) = var("MINIMARKET_PORT") {
            if let Ok(p) = port.parse::<u16>() {
                debug!(port = p, "Overriding port from environment");
                self.http.port = p;
            }
        }

        if let Some(path) = var("MINIMARKET_DB_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(filter) = var("MINIMARKET_LOG") {
            self.logging.filter = filter;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "minimarket", "server")
            .map(|dirs| dirs.config_dir().join("server.toml"))
    }

    /// The database file to open.
    ///
    /// Falls back to `minimarket.db` in the platform data directory, then to
    /// the working directory.
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.database.path {
            return path.clone();
        }

        directories::ProjectDirs::from("com", "minimarket", "server")
            .map(|dirs| dirs.data_dir().join("minimarket.db"))
            .unwrap_or_else(|| PathBuf::from("minimarket.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [http]
            port = 9000
            "#,
        )
        .unwrap();

        assert_eq!(config.http.port, 9000);
        assert_eq!(config.http.bind_addr, "127.0.0.1");
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("MINIMARKET_BIND_ADDR", "0.0.0.0"),
            ("MINIMARKET_PORT", "3000"),
            ("MINIMARKET_DB_PATH", "/tmp/shop.db"),
            ("MINIMARKET_LOG", "warn"),
        ]);

        let mut config = ServerConfig::default();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.http.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.database_path(), PathBuf::from("/tmp/shop.db"));
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn test_bad_port_is_ignored() {
        let mut config = ServerConfig::default();
        config.apply_env_overrides(|key| (key == "MINIMARKET_PORT").then(|| "http".to_string()));

        assert_eq!(config.http.port, 8080);
    }

    #[test]
    fn test_validation() {
        let mut config = ServerConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        config.database.max_connections = 1;
        config.http.bind_addr = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = std::env::temp_dir().join(format!("minimarket-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("server.toml");
        std::fs::write(&path, "[database]\nmax_connections = 3\n").unwrap();

        let config = ServerConfig::load(Some(path)).unwrap();
        assert_eq!(config.database.max_connections, 3);

        std::fs::remove_dir_all(&dir).ok();
    }
}

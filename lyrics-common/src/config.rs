//! Configuration loading and resolution
//!
//! Every setting is resolved in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Command-line arguments and environment variables are parsed by the binary
//! (clap) and arrive here as [`ConfigOverrides`]. A missing TOML file is not an
//! error: the service starts with defaults and logs a warning.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Application folder name under the platform config/data directories
pub const APP_DIR: &str = "lyrics";

/// Compiled defaults
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5780;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Contents of the TOML config file; every key is optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<PathBuf>,
    pub cors_origins: Option<Vec<String>>,
    pub broadcast_send_timeout_ms: Option<u64>,
    pub channel_capacity: Option<usize>,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    /// Parse a TOML config file, falling back to defaults if it is missing
    ///
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let config = Self::load(path)?;
        info!("Loaded config file {}", path.display());
        Ok(config)
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<PathBuf>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    /// Origins allowed by CORS
    pub cors_origins: Vec<String>,
    /// Upper bound on a single channel send during broadcast
    pub send_timeout: Duration,
    /// Queue depth of each notification channel
    pub channel_capacity: usize,
}

impl ServiceConfig {
    /// Merge overrides over TOML values over compiled defaults
    pub fn resolve(overrides: ConfigOverrides, toml: TomlConfig) -> Self {
        let host = overrides
            .host
            .or(toml.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = overrides.port.or(toml.port).unwrap_or(DEFAULT_PORT);

        let database_path = overrides
            .database
            .or(toml.database)
            .unwrap_or_else(default_database_path);

        let cors_origins = toml
            .cors_origins
            .unwrap_or_else(|| vec![DEFAULT_CORS_ORIGIN.to_string()]);

        let send_timeout = crate::time::millis_to_duration(
            toml.broadcast_send_timeout_ms
                .unwrap_or(DEFAULT_SEND_TIMEOUT_MS),
        );

        // A zero-capacity queue cannot be created; treat it as 1
        let channel_capacity = toml
            .channel_capacity
            .unwrap_or(DEFAULT_CHANNEL_CAPACITY)
            .max(1);

        Self {
            host,
            port,
            database_path,
            cors_origins,
            send_timeout,
            channel_capacity,
        }
    }

    /// `host:port` string for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Default config file path: `<config dir>/lyrics/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR).join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("./lyrics_config.toml"))
}

/// Default database path: `<data dir>/lyrics/lyrics.db`
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR).join("lyrics.db"))
        .unwrap_or_else(|| PathBuf::from("./lyrics_data/lyrics.db"))
}

/// Create the folder that will hold `file_path` if it does not exist
pub fn ensure_parent_dir(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            info!("Created directory {}", parent.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_with_nothing_uses_defaults() {
        let config = ServiceConfig::resolve(ConfigOverrides::default(), TomlConfig::default());
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.database_path, default_database_path());
        assert_eq!(config.cors_origins, vec![DEFAULT_CORS_ORIGIN.to_string()]);
        assert_eq!(config.send_timeout, Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS));
        assert_eq!(config.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_overrides_beat_toml() {
        let toml = TomlConfig {
            host: Some("0.0.0.0".to_string()),
            port: Some(9000),
            database: Some(PathBuf::from("/tmp/from-toml.db")),
            ..Default::default()
        };
        let overrides = ConfigOverrides {
            port: Some(9100),
            ..Default::default()
        };

        let config = ServiceConfig::resolve(overrides, toml);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9100);
        assert_eq!(config.database_path, PathBuf::from("/tmp/from-toml.db"));
        assert_eq!(config.bind_address(), "0.0.0.0:9100");
    }

    #[test]
    fn test_zero_channel_capacity_is_clamped() {
        let toml = TomlConfig {
            channel_capacity: Some(0),
            ..Default::default()
        };
        let config = ServiceConfig::resolve(ConfigOverrides::default(), toml);
        assert_eq!(config.channel_capacity, 1);
    }
}

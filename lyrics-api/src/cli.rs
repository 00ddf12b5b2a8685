//! Command-line arguments
//!
//! Each argument can also come from its environment variable; both take
//! priority over the TOML config file.

use clap::Parser;
use lyrics_common::config::{default_config_path, ConfigOverrides};
use std::path::PathBuf;

/// Command-line arguments for lyrics-api
#[derive(Parser, Debug, Clone)]
#[command(name = "lyrics-api")]
#[command(about = "Song lyrics catalog service")]
#[command(version)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "LYRICS_PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "LYRICS_HOST")]
    pub host: Option<String>,

    /// SQLite database file
    #[arg(short, long, env = "LYRICS_DATABASE")]
    pub database: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, env = "LYRICS_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Args {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env() {
        for var in ["LYRICS_PORT", "LYRICS_HOST", "LYRICS_DATABASE", "LYRICS_CONFIG"] {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_no_arguments_leaves_everything_unset() {
        clear_env();
        let args = Args::parse_from(["lyrics-api"]);
        let overrides = args.overrides();
        assert!(overrides.host.is_none());
        assert!(overrides.port.is_none());
        assert!(overrides.database.is_none());
        assert_eq!(args.config_path(), default_config_path());
    }

    #[test]
    #[serial]
    fn test_environment_variables_are_read() {
        clear_env();
        env::set_var("LYRICS_PORT", "6200");
        env::set_var("LYRICS_DATABASE", "/tmp/lyrics-env.db");

        let args = Args::parse_from(["lyrics-api"]);
        assert_eq!(args.port, Some(6200));
        assert_eq!(args.database, Some(PathBuf::from("/tmp/lyrics-env.db")));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_command_line_beats_environment() {
        clear_env();
        env::set_var("LYRICS_PORT", "6200");

        let args = Args::parse_from(["lyrics-api", "--port", "6300", "--host", "0.0.0.0"]);
        assert_eq!(args.port, Some(6300));
        assert_eq!(args.host.as_deref(), Some("0.0.0.0"));

        clear_env();
    }
}

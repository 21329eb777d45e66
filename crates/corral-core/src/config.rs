//! Configuration management.
//!
//! Corral configuration is loaded from multiple sources with the following
//! priority:
//!
//! 1. Environment variables (CORRAL_*)
//! 2. User configuration file (~/.config/corral/config.toml)
//! 3. System configuration file (/etc/corral/config.toml)
//! 4. Default values
//!
//! ## Example Configuration File
//!
//! ```toml
//! data_dir = "~/.corral"
//!
//! [api]
//! socket_path = "~/.corral/corral.sock"
//!
//! [logging]
//! level = "info"
//! format = "text"
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Corral daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data directory.
    pub data_dir: PathBuf,
    /// Service API configuration.
    pub api: ApiConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            api: ApiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from files and environment.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(system_config_path()))
            .merge(Toml::file(user_config_path()))
            .merge(Env::prefixed("CORRAL_").split("_"))
            .extract()
    }

    /// Loads configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("CORRAL_").split("_"))
            .extract()
    }

    /// Returns the path to the daemon PID file.
    #[must_use]
    pub fn pid_file(&self) -> PathBuf {
        self.data_dir.join("daemon.pid")
    }
}

/// Service API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Unix socket path for the service API.
    pub socket_path: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Log format (text, json).
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/var/lib"))
        .join(".corral")
}

/// Default Unix socket path for the service API.
#[must_use]
pub fn default_socket_path() -> PathBuf {
    default_data_dir().join("corral.sock")
}

fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("corral")
        .join("config.toml")
}

fn system_config_path() -> PathBuf {
    PathBuf::from("/etc/corral/config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.data_dir.ends_with(".corral"));
        assert!(config.api.socket_path.ends_with("corral.sock"));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "data_dir = \"/tmp/corral-test\"\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/corral-test"));
        assert_eq!(config.logging.level, "debug");
        // Unset sections keep their defaults.
        assert!(config.api.socket_path.ends_with("corral.sock"));
    }

    #[test]
    fn test_pid_file_under_data_dir() {
        let config = Config::default();
        assert!(config.pid_file().ends_with("daemon.pid"));
        assert!(config.pid_file().starts_with(&config.data_dir));
    }
}

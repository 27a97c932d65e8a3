//! Configuration loader for procmem
//!
//! Handles loading configuration from TOML files and merging with defaults.

use super::defaults::default_config;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "PROCMEM_CONFIG";

/// File used when [`CONFIG_ENV_VAR`] is unset
pub const DEFAULT_CONFIG_FILE: &str = "procmem.toml";

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,

    #[serde(default = "default_scanner")]
    pub scanner: ScannerConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` level filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Include the event target (module path) in log lines
    #[serde(default = "default_with_target")]
    pub with_target: bool,
}

/// Scanner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Candidate addresses examined between cancellation checks
    #[serde(default = "default_step_budget")]
    pub step_budget: usize,
    /// Upper bound on the length of a single scan
    #[serde(default = "default_max_scan_length")]
    pub max_scan_length: usize,
}

/// Configuration loader
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ConfigLoader {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Path this loader reads and writes
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Loads configuration from file
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Err(ConfigError::FileNotFound(
                self.config_path.display().to_string(),
            ));
        }

        let contents = fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Loads configuration or returns defaults if the file is missing or unreadable
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(ConfigError::FileNotFound(_)) => Config::default(),
            Err(err) => {
                warn!(path = %self.config_path.display(), %err, "ignoring configuration file");
                Config::default()
            }
        }
    }

    /// Saves configuration to file
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, contents)?;
        Ok(())
    }
}

/// Loads configuration from `$PROCMEM_CONFIG`, or `procmem.toml` in the working directory.
///
/// A missing file yields the defaults; a file that exists but does not parse
/// is an error.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = env::var_os(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    match ConfigLoader::new(path).load() {
        Err(ConfigError::FileNotFound(_)) => Ok(Config::default()),
        other => other,
    }
}

fn default_logging() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        with_target: default_with_target(),
    }
}

fn default_scanner() -> ScannerConfig {
    ScannerConfig {
        step_budget: default_step_budget(),
        max_scan_length: default_max_scan_length(),
    }
}

fn default_log_level() -> String {
    default_config().logging.level
}

fn default_with_target() -> bool {
    default_config().logging.with_target
}

fn default_step_budget() -> usize {
    default_config().scanner.step_budget
}

fn default_max_scan_length() -> usize {
    default_config().scanner.max_scan_length
}

impl Default for Config {
    fn default() -> Self {
        Config {
            logging: default_logging(),
            scanner: default_scanner(),
        }
    }
}

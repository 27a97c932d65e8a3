//! Configuration module for procmem
//!
//! Provides configuration loading, validation, and default settings
//! for the procmem command line tool.

mod defaults;
mod loader;
mod validator;

pub use defaults::{default_config, ConfigDefaults};
pub use loader::{
    load_config, Config, ConfigError, ConfigLoader, LoggingConfig, ScannerConfig, CONFIG_ENV_VAR,
    DEFAULT_CONFIG_FILE,
};
pub use validator::{validate_config, ConfigValidator};

// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

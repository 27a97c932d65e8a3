//! Configuration validator for procmem
//!
//! Validates configuration values to ensure they are within acceptable ranges.

use super::loader::{Config, ConfigError, LoggingConfig, ScannerConfig};

/// Level names accepted by `tracing_subscriber::EnvFilter`
const VALID_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the entire configuration
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_logging(&config.logging)?;
        Self::validate_scanner(&config.scanner)?;
        Ok(())
    }

    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        if !VALID_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                logging.level, VALID_LEVELS
            )));
        }

        Ok(())
    }

    fn validate_scanner(scanner: &ScannerConfig) -> Result<(), ConfigError> {
        if scanner.step_budget == 0 {
            return Err(ConfigError::Invalid(
                "Scanner step budget must be at least 1".to_string(),
            ));
        }

        if scanner.step_budget > scanner.max_scan_length {
            return Err(ConfigError::Invalid(format!(
                "Scanner step budget ({}) cannot exceed the maximum scan length ({})",
                scanner.step_budget, scanner.max_scan_length
            )));
        }

        Ok(())
    }
}

/// Validates a configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    ConfigValidator::validate(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("log level"));

        config.logging.level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_step_budget() {
        let mut config = Config::default();
        config.scanner.step_budget = 0;
        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("step budget"));
    }

    #[test]
    fn test_budget_larger_than_scan() {
        let mut config = Config::default();
        config.scanner.max_scan_length = 100;
        config.scanner.step_budget = 101;
        assert!(validate_config(&config).is_err());

        config.scanner.step_budget = 100;
        assert!(validate_config(&config).is_ok());
    }
}

//! Default configuration values for procmem

use crate::memory::DEFAULT_STEP_BUDGET;
use serde::{Deserialize, Serialize};

/// Default configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDefaults {
    pub logging: LoggingDefaults,
    pub scanner: ScannerDefaults,
}

/// Default logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingDefaults {
    pub level: String,
    pub with_target: bool,
}

/// Default scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerDefaults {
    pub step_budget: usize,
    pub max_scan_length: usize,
}

/// Returns the default configuration
pub fn default_config() -> ConfigDefaults {
    ConfigDefaults {
        logging: LoggingDefaults {
            level: "info".to_string(),
            with_target: false,
        },
        scanner: ScannerDefaults {
            step_budget: DEFAULT_STEP_BUDGET,
            max_scan_length: 64 * 1024 * 1024, // 64MB
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_defaults() {
        let config = default_config();
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.with_target);
    }

    #[test]
    fn test_scanner_defaults() {
        let config = default_config();
        assert_eq!(config.scanner.step_budget, 4096);
        assert_eq!(config.scanner.max_scan_length, 67108864);
        assert!(config.scanner.step_budget <= config.scanner.max_scan_length);
    }

    #[test]
    fn test_serialization() {
        let config = default_config();
        let serialized = toml::to_string(&config).unwrap();
        assert!(serialized.contains("step_budget"));
        assert!(serialized.contains("level"));

        let deserialized: ConfigDefaults = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.logging.level, config.logging.level);
        assert_eq!(deserialized.scanner.step_budget, config.scanner.step_budget);
    }
}

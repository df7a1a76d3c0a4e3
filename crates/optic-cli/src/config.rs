//! Configuration for the `optic` CLI
//!
//! Loads settings from a YAML file (`--config`, or `optic.yaml` in the
//! working directory). A `.env` file is read at startup, and environment
//! variables always override the YAML values.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "optic.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {name}: {value}")]
    InvalidEnvVar { name: String, value: String },
}

/// How the wire document is printed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Indent the JSON document
    pub pretty: bool,

    /// Also print the document's SHA-256 fingerprint
    pub fingerprint: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or module-specific
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// Output destination: stderr, file, both
    pub output: String,

    /// Directory for log files
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "compact".to_string(),
            output: "stderr".to_string(),
            directory: "./logs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from YAML file with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for runs without a config file
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// `path` if given, else [`DEFAULT_CONFIG_FILE`] if present, else defaults
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::load(DEFAULT_CONFIG_FILE),
            None => Self::from_env(),
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(pretty) = env_flag("OPTIC_OUTPUT_PRETTY")? {
            self.output.pretty = pretty;
        }
        if let Some(fingerprint) = env_flag("OPTIC_OUTPUT_FINGERPRINT")? {
            self.output.fingerprint = fingerprint;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Ok(output) = std::env::var("LOG_OUTPUT") {
            self.logging.output = output;
        }
        if let Ok(dir) = std::env::var("LOG_DIR") {
            self.logging.directory = dir;
        }
        Ok(())
    }
}

fn env_flag(name: &str) -> Result<Option<bool>, ConfigError> {
    let Ok(value) = std::env::var(name) else {
        return Ok(None);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidEnvVar {
            name: name.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.output.pretty);
        assert!(!config.output.fingerprint);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "compact");
        assert_eq!(config.logging.output, "stderr");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str("output:\n  pretty: true\n").unwrap();
        assert!(config.output.pretty);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_env_var_override() {
        std::env::set_var("OPTIC_OUTPUT_FINGERPRINT", "yes");

        let config_yaml = r#"
output:
  pretty: true
  fingerprint: false
logging:
  level: "info"
  format: "json"
  output: "file"
  directory: "./logs"
"#;
        let temp_file = std::env::temp_dir().join("optic_test_config.yaml");
        std::fs::write(&temp_file, config_yaml).unwrap();

        let config = Config::load(&temp_file).unwrap();
        assert!(config.output.pretty);
        assert!(config.output.fingerprint); // Overridden

        std::env::remove_var("OPTIC_OUTPUT_FINGERPRINT");
        std::fs::remove_file(temp_file).ok();
    }

    #[test]
    fn test_invalid_flag() {
        std::env::set_var("OPTIC_TEST_FLAG", "maybe");
        assert!(matches!(
            env_flag("OPTIC_TEST_FLAG"),
            Err(ConfigError::InvalidEnvVar { .. })
        ));
        std::env::remove_var("OPTIC_TEST_FLAG");
        assert_eq!(env_flag("OPTIC_TEST_FLAG").unwrap(), None);
    }
}

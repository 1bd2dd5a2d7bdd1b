//! Configuration management
//!
//! This module handles loading and managing configuration from:
//! - Command-line arguments
//! - Configuration files (TOML)
//! - Defaults

use crate::error::{Error, Result};
use crate::state_machine::annotation::DEFAULT_MARKER;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Inference settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Add a return message flow when an invoking task has no receiving
    /// task, instead of letting the task receive its own answer
    #[serde(default)]
    pub rewrite: bool,

    /// State label marker used when the participant name carries none
    #[serde(default = "default_label_marker")]
    pub label_marker: String,

    /// Prefix of generated names for unlabelled states
    #[serde(default = "default_placeholder_prefix")]
    pub placeholder_prefix: String,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format (json, table)
    #[serde(default = "default_format")]
    pub format: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_label_marker() -> String {
    DEFAULT_MARKER.to_string()
}

fn default_placeholder_prefix() -> String {
    "S_".to_string()
}

fn default_format() -> String {
    "json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// Default implementations

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            rewrite: false,
            label_marker: default_label_marker(),
            placeholder_prefix: default_placeholder_prefix(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file {:?}: {}", path, e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    ///
    /// Searches in order:
    /// 1. ./process-fsm.toml
    /// 2. ~/.process-fsm/config.toml
    /// 3. /etc/process-fsm/config.toml
    pub fn load() -> Result<Self> {
        let mut paths = vec![PathBuf::from("process-fsm.toml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".process-fsm").join("config.toml"));
        }
        paths.push(PathBuf::from("/etc/process-fsm/config.toml"));

        for path in paths {
            if path.exists() {
                tracing::info!("Loading config from {:?}", path);
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    fn validate(&self) -> Result<()> {
        if self.analyzer.label_marker.trim().is_empty()
            || self.analyzer.label_marker.contains(char::is_whitespace)
        {
            return Err(Error::Config(format!(
                "label_marker must be a single non-empty token, got {:?}",
                self.analyzer.label_marker
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.analyzer.rewrite);
        assert_eq!(config.analyzer.label_marker, "@");
        assert_eq!(config.analyzer.placeholder_prefix, "S_");
        assert_eq!(config.output.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_toml_config() {
        let toml = r##"
[analyzer]
rewrite = true
label_marker = "#"

[logging]
level = "debug"
        "##;

        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.analyzer.rewrite);
        assert_eq!(config.analyzer.label_marker, "#");
        assert_eq!(config.analyzer.placeholder_prefix, "S_");
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_marker_rejected() {
        let mut config = Config::default();
        config.analyzer.label_marker = " ".into();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_missing_file() {
        let err = Config::from_file("/nonexistent/process-fsm.toml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}

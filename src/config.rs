//! Configuration management
//!
//! This module handles loading and managing configuration from:
//! - Command-line arguments
//! - Environment variables
//! - Configuration files (TOML)
//! - Defaults

use crate::error::{Error, Result};
use crate::state_machine::analyzer::DEFAULT_FAULT_KEYWORDS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub default: DefaultConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultConfig {
    /// Model schema file; the reference catalog is used when unset
    pub model: Option<PathBuf>,

    /// Output format for listings (table, json)
    #[serde(default = "default_format")]
    pub format: String,
}

/// Analysis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Label fragments marking an event transition as a fault condition
    #[serde(default = "default_fault_keywords")]
    pub fault_keywords: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_format() -> String {
    "table".to_string()
}

fn default_fault_keywords() -> Vec<String> {
    DEFAULT_FAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

fn default_log_level() -> String {
    "warn".to_string()
}

// Default implementations

impl Default for DefaultConfig {
    fn default() -> Self {
        Self {
            model: None,
            format: default_format(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fault_keywords: default_fault_keywords(),
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

        Ok(config)
    }

    /// Default configuration file locations, in search order:
    /// 1. ./config.toml
    /// 2. ~/.obsstate-graph/config.toml
    /// 3. /etc/obsstate-graph/config.toml
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".obsstate-graph").join("config.toml"));
        }
        paths.push(PathBuf::from("/etc/obsstate-graph/config.toml"));
        paths
    }

    /// First existing file among [`search_paths`](Self::search_paths)
    pub fn find() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|path| path.exists())
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        match Self::find() {
            Some(path) => Self::from_file(path),
            None => Ok(Config::default()),
        }
    }

    /// Model schema path set in the config file.
    ///
    /// `--model` and `OBSSTATE_MODEL` take precedence; the CLI resolves those.
    pub fn model_path(&self) -> Option<PathBuf> {
        self.default.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.default.model.is_none());
        assert_eq!(config.default.format, "table");
        assert_eq!(config.analysis.fault_keywords, ["fault", "error"]);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_parse_toml_config() {
        let toml = r#"
[default]
model = "models/csp.toml"

[analysis]
fault_keywords = ["fault", "fatal"]

[logging]
level = "debug"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.default.model, Some(PathBuf::from("models/csp.toml")));
        assert_eq!(config.default.format, "table");
        assert_eq!(config.analysis.fault_keywords, ["fault", "fatal"]);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_search_order() {
        let paths = Config::search_paths();
        assert_eq!(paths.first(), Some(&PathBuf::from("config.toml")));
        assert_eq!(
            paths.last(),
            Some(&PathBuf::from("/etc/obsstate-graph/config.toml"))
        );
        match Config::find() {
            Some(found) => assert!(paths.contains(&found)),
            None => assert_eq!(Config::load().unwrap().default.format, "table"),
        }
    }

    #[test]
    fn test_model_path_comes_from_file_only() {
        let config = Config::default();
        assert_eq!(config.model_path(), None);

        let config: Config = toml::from_str("[default]\nmodel = \"sdp.json\"").unwrap();
        assert_eq!(config.model_path(), Some(PathBuf::from("sdp.json")));
    }

    #[test]
    fn test_from_file_errors() {
        assert!(matches!(
            Config::from_file("/nonexistent/obsstate-graph.toml"),
            Err(Error::Config(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[logging\nlevel = 3").unwrap();
        assert!(matches!(Config::from_file(file.path()), Err(Error::Config(_))));
    }
}

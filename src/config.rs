// Tue Jan 13 2026 - Alex

use crate::utils::LoggingUtils;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0:?}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Analysis settings, read from a JSON file and overridden from the command
/// line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rule_files: Vec<PathBuf>,
    /// Empty means every group found in the rule files.
    pub active_groups: Vec<String>,
    pub type_layout: Option<PathBuf>,
    pub log_level: String,
    pub warn_unmatched_rules: bool,
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rule_files: Vec::new(),
            active_groups: Vec::new(),
            type_layout: None,
            log_level: "warn".to_string(),
            warn_unmatched_rules: true,
            color: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !ext.eq_ignore_ascii_case("json") {
            return Err(ConfigError::UnsupportedFormat(ext.to_string()));
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_rule_file(mut self, path: PathBuf) -> Self {
        self.rule_files.push(path);
        self
    }

    pub fn with_active_groups(mut self, groups: Vec<String>) -> Self {
        self.active_groups = groups;
        self
    }

    pub fn with_type_layout(mut self, path: PathBuf) -> Self {
        self.type_layout = Some(path);
        self
    }

    pub fn with_log_level(mut self, level: &str) -> Self {
        self.log_level = level.to_string();
        self
    }

    pub fn with_warn_unmatched_rules(mut self, warn: bool) -> Self {
        self.warn_unmatched_rules = warn;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if LoggingUtils::level_from_str(&self.log_level).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "unknown log level '{}'",
                self.log_level
            )));
        }
        if self.active_groups.iter().any(|g| g.trim().is_empty()) {
            return Err(ConfigError::ValidationError("empty group name in active_groups".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_json_uses_defaults() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{ "rule_files": ["a.rcl"], "active_groups": ["render"] }}"#).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.rule_files, vec![PathBuf::from("a.rcl")]);
        assert_eq!(config.active_groups, vec!["render".to_string()]);
        assert_eq!(config.log_level, "warn");
        assert!(config.warn_unmatched_rules);
    }

    #[test]
    fn test_validate() {
        assert!(Config::new().validate().is_ok());
        assert!(Config::new().with_log_level("chatty").validate().is_err());
        assert!(Config::new()
            .with_active_groups(vec![" ".to_string()])
            .validate()
            .is_err());
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            Config::load("/nonexistent/heap.json"),
            Err(ConfigError::NotFound(_))
        ));
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}

//! Configuration file parser for multiple formats

use crate::{ConfigError, DashboardConfig, Result};
use std::fs;
use std::path::Path;

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Configuration parser
pub struct ConfigParser;

impl ConfigParser {
    /// Parse configuration from a file
    pub fn parse_file(path: impl AsRef<Path>) -> Result<DashboardConfig> {
        let path = path.as_ref();

        let content = fs::read_to_string(path)?;
        let format = Self::detect_format(path)?;

        Self::parse_string(&content, format)
    }

    /// Parse configuration from a string
    pub fn parse_string(content: &str, format: ConfigFormat) -> Result<DashboardConfig> {
        match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| ConfigError::Parse(format!("YAML parse error: {e}"))),
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| ConfigError::Parse(format!("JSON parse error: {e}"))),
            ConfigFormat::Toml => toml::from_str(content)
                .map_err(|e| ConfigError::Parse(format!("TOML parse error: {e}"))),
        }
    }

    /// Detect configuration format from file extension
    pub fn detect_format(path: &Path) -> Result<ConfigFormat> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ConfigError::Parse("Cannot determine config format from file extension".to_string())
        })?;

        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "json" => Ok(ConfigFormat::Json),
            "toml" => Ok(ConfigFormat::Toml),
            _ => Err(ConfigError::Parse(format!(
                "Unsupported config format: {ext}"
            ))),
        }
    }

    /// Serialize a configuration in the given format
    pub fn to_string(config: &DashboardConfig, format: ConfigFormat) -> Result<String> {
        match format {
            ConfigFormat::Yaml => serde_yaml::to_string(config)
                .map_err(|e| ConfigError::Parse(format!("YAML serialize error: {e}"))),
            ConfigFormat::Json => serde_json::to_string_pretty(config)
                .map_err(|e| ConfigError::Parse(format!("JSON serialize error: {e}"))),
            ConfigFormat::Toml => toml::to_string_pretty(config)
                .map_err(|e| ConfigError::Parse(format!("TOML serialize error: {e}"))),
        }
    }
}

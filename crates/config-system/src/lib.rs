//! Configuration system for GovMap
//! Data sources, layout constants, viewport limits and table defaults

use govmap_shared::store_state::SortSpec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod hot_reload;
pub mod parser;
pub mod validation;

pub use hot_reload::{ConfigUpdateEvent, HotReloadManager};
pub use parser::{ConfigFormat, ConfigParser};
pub use validation::ConfigValidator;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Hot reload error: {0}")]
    HotReload(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Complete dashboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub version: String,
    pub data: DataConfig,
    pub layout: LayoutConfig,
    pub viewport: ViewportConfig,
    pub nodes: NodeStyleConfig,
    pub table: TableConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            data: DataConfig::default(),
            layout: LayoutConfig::default(),
            viewport: ViewportConfig::default(),
            nodes: NodeStyleConfig::default(),
            table: TableConfig::default(),
        }
    }
}

/// Where the pre-computed datasets live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Base URL or directory the resource paths are relative to
    pub base_url: String,
    pub coordinates_path: String,
    /// `{chain}` is replaced by the chain key
    pub proposals_path: String,
    pub voting_patterns_path: String,
    pub chains: Vec<String>,
    /// Maximum number of fetched payloads kept in the LRU cache
    pub cache_entries: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base_url: "/data".to_string(),
            coordinates_path: "coordinates.json".to_string(),
            proposals_path: "proposals/{chain}.json".to_string(),
            voting_patterns_path: "voting_patterns/{chain}.json".to_string(),
            chains: vec!["cosmos".to_string(), "osmosis".to_string()],
            cache_entries: 64,
        }
    }
}

impl DataConfig {
    pub fn proposals_resource(&self, chain: &str) -> String {
        self.proposals_path.replace("{chain}", chain)
    }

    pub fn voting_patterns_resource(&self, chain: &str) -> String {
        self.voting_patterns_path.replace("{chain}", chain)
    }
}

/// Unit-square layout constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Fraction of the coordinate range added on each side before rescaling
    pub padding: f64,
    /// Rim radius of the ego network, in unit-square coordinates
    pub ego_max_radius: f64,
    pub cluster_count: u8,
    /// Share of a cluster sector the per-validator angle jitter may span
    pub jitter_span: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            padding: 0.05,
            ego_max_radius: 0.4,
            cluster_count: 5,
            jitter_span: 0.6,
        }
    }
}

/// Zoom/pan limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub reset_transition_ms: f64,
    /// Wheel zoom: scale multiplies by 2^(-delta_y * wheel_factor)
    pub wheel_factor: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: 1.0,
            max_zoom: 3.5,
            reset_transition_ms: 750.0,
            wheel_factor: 0.002,
        }
    }
}

/// Node radii in container pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeStyleConfig {
    pub min_radius: f64,
    pub max_radius: f64,
    pub reference_bonus: f64,
    pub comparison_bonus: f64,
}

impl Default for NodeStyleConfig {
    fn default() -> Self {
        Self {
            min_radius: 3.0,
            max_radius: 9.0,
            reference_bonus: 4.0,
            comparison_bonus: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub default_sort: SortSpec,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_templates() {
        let data = DataConfig::default();
        assert_eq!(data.proposals_resource("juno"), "proposals/juno.json");
        assert_eq!(
            data.voting_patterns_resource("juno"),
            "voting_patterns/juno.json"
        );
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: DashboardConfig =
            serde_json::from_str(r#"{"viewport":{"max_zoom":5.0}}"#).unwrap();
        assert_eq!(config.viewport.max_zoom, 5.0);
        assert_eq!(config.viewport.min_zoom, 1.0);
        assert_eq!(config.layout, LayoutConfig::default());
    }
}

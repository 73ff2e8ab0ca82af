//! Configuration validation utilities

use crate::{
    ConfigError, DashboardConfig, DataConfig, LayoutConfig, NodeStyleConfig, Result,
    ViewportConfig,
};

/// Configuration validator with range and cross-field checks
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete configuration
    pub fn validate(config: &DashboardConfig) -> Result<()> {
        Self::validate_data(&config.data)?;
        Self::validate_layout(&config.layout)?;
        Self::validate_viewport(&config.viewport)?;
        Self::validate_nodes(&config.nodes)?;

        Ok(())
    }

    fn validate_data(data: &DataConfig) -> Result<()> {
        for (name, template) in [
            ("proposals_path", &data.proposals_path),
            ("voting_patterns_path", &data.voting_patterns_path),
        ] {
            if !template.contains("{chain}") {
                return Err(ConfigError::Validation(format!(
                    "{name} must contain a {{chain}} placeholder: {template}"
                )));
            }
        }

        if data.coordinates_path.is_empty() {
            return Err(ConfigError::Validation(
                "coordinates_path cannot be empty".to_string(),
            ));
        }

        if let Some(chain) = data.chains.iter().find(|c| c.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "Invalid chain key: {chain:?}"
            )));
        }

        if data.cache_entries == 0 {
            return Err(ConfigError::Validation(
                "cache_entries must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_layout(layout: &LayoutConfig) -> Result<()> {
        if !(0.0..0.5).contains(&layout.padding) {
            return Err(ConfigError::Validation(format!(
                "Invalid padding: {}. Must be in [0.0, 0.5)",
                layout.padding
            )));
        }

        if layout.ego_max_radius <= 0.0 || layout.ego_max_radius > 0.5 {
            return Err(ConfigError::Validation(format!(
                "Invalid ego_max_radius: {}. Must be in (0.0, 0.5]",
                layout.ego_max_radius
            )));
        }

        if layout.cluster_count == 0 {
            return Err(ConfigError::Validation(
                "cluster_count must be at least 1".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&layout.jitter_span) {
            return Err(ConfigError::Validation(format!(
                "Invalid jitter_span: {}. Must be between 0.0 and 1.0",
                layout.jitter_span
            )));
        }

        Ok(())
    }

    fn validate_viewport(viewport: &ViewportConfig) -> Result<()> {
        if viewport.min_zoom <= 0.0 || viewport.max_zoom < viewport.min_zoom {
            return Err(ConfigError::Validation(format!(
                "Invalid zoom extent: [{}, {}]",
                viewport.min_zoom, viewport.max_zoom
            )));
        }

        if viewport.reset_transition_ms < 0.0 {
            return Err(ConfigError::Validation(format!(
                "Invalid reset_transition_ms: {}",
                viewport.reset_transition_ms
            )));
        }

        if viewport.wheel_factor <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "Invalid wheel_factor: {}",
                viewport.wheel_factor
            )));
        }

        Ok(())
    }

    fn validate_nodes(nodes: &NodeStyleConfig) -> Result<()> {
        if nodes.min_radius <= 0.0 || nodes.max_radius < nodes.min_radius {
            return Err(ConfigError::Validation(format!(
                "Invalid node radius range: [{}, {}]",
                nodes.min_radius, nodes.max_radius
            )));
        }

        if nodes.reference_bonus < 0.0 || nodes.comparison_bonus < 0.0 {
            return Err(ConfigError::Validation(
                "Node size bonuses cannot be negative".to_string(),
            ));
        }

        if nodes.comparison_bonus > nodes.reference_bonus {
            log::warn!(
                "comparison_bonus {} exceeds reference_bonus {}",
                nodes.comparison_bonus,
                nodes.reference_bonus
            );
        }

        Ok(())
    }
}

//! Hot-reload of the dashboard configuration with validation and rollback

use crate::{ConfigError, ConfigValidator, DashboardConfig, Result};
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Configuration update event
#[derive(Debug, Clone)]
pub struct ConfigUpdateEvent {
    pub timestamp: DateTime<Utc>,
    pub old_version: String,
    pub new_version: String,
    pub changed_sections: Vec<String>,
}

/// Hot-reload configuration manager
pub struct HotReloadManager {
    /// Current configuration wrapped in ArcSwap for lock-free reads
    current_config: Arc<ArcSwap<DashboardConfig>>,

    /// Configuration history for rollback
    history: Arc<RwLock<Vec<(DateTime<Utc>, Arc<DashboardConfig>)>>>,

    update_tx: broadcast::Sender<ConfigUpdateEvent>,

    max_history: usize,
}

impl HotReloadManager {
    /// Create a manager around an already validated configuration
    pub fn new(initial_config: DashboardConfig) -> Result<Self> {
        ConfigValidator::validate(&initial_config)?;
        let (update_tx, _) = broadcast::channel(16);
        let initial = Arc::new(initial_config);

        Ok(Self {
            current_config: Arc::new(ArcSwap::new(initial.clone())),
            history: Arc::new(RwLock::new(vec![(Utc::now(), initial)])),
            update_tx,
            max_history: 10,
        })
    }

    /// Get the current configuration
    pub fn current(&self) -> Arc<DashboardConfig> {
        self.current_config.load_full()
    }

    /// Validate and install a new configuration. Returns the changed
    /// section names; an identical configuration is a no-op.
    pub fn update(&self, new_config: DashboardConfig) -> Result<Vec<String>> {
        ConfigValidator::validate(&new_config)?;

        let old_config = self.current_config.load_full();
        if *old_config == new_config {
            return Ok(Vec::new());
        }

        let changed_sections = Self::calculate_changes(&old_config, &new_config);
        let event = ConfigUpdateEvent {
            timestamp: Utc::now(),
            old_version: old_config.version.clone(),
            new_version: new_config.version.clone(),
            changed_sections: changed_sections.clone(),
        };

        let new_config = Arc::new(new_config);
        self.current_config.store(new_config.clone());

        {
            let mut history = self.history.write();
            history.push((Utc::now(), new_config));
            if history.len() > self.max_history {
                history.remove(0);
            }
        }

        log::info!("Configuration updated: {changed_sections:?}");
        // send fails only when no receiver is subscribed
        let _ = self.update_tx.send(event);

        Ok(changed_sections)
    }

    /// Roll back `steps` updates
    pub fn rollback(&self, steps: usize) -> Result<()> {
        let history = self.history.read();

        if steps >= history.len() {
            return Err(ConfigError::HotReload(
                "Not enough history for rollback".to_string(),
            ));
        }

        let target_idx = history.len() - 1 - steps;
        let target_config = history[target_idx].1.clone();
        drop(history);

        log::info!("Rolling configuration back {steps} step(s)");
        self.current_config.store(target_config);

        Ok(())
    }

    /// Subscribe to configuration updates
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigUpdateEvent> {
        self.update_tx.subscribe()
    }

    pub fn history_len(&self) -> usize {
        self.history.read().len()
    }

    fn calculate_changes(old: &DashboardConfig, new: &DashboardConfig) -> Vec<String> {
        let mut changes = Vec::new();

        if old.version != new.version {
            changes.push("version".to_string());
        }
        if old.data != new.data {
            changes.push("data".to_string());
        }
        if old.layout != new.layout {
            changes.push("layout".to_string());
        }
        if old.viewport != new.viewport {
            changes.push("viewport".to_string());
        }
        if old.nodes != new.nodes {
            changes.push("nodes".to_string());
        }
        if old.table != new.table {
            changes.push("table".to_string());
        }

        changes
    }
}

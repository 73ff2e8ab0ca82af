//! GovMap system integration
//!
//! Ties the data manager, the selection state, the layout engine and the
//! viewport together into a [`DashboardSession`]: one reducer entry point
//! and a set of memoized derived views.

pub mod api;
pub mod memo;
pub mod session;

use govmap_config::ConfigError;
use govmap_shared::GovMapError;
use thiserror::Error;

pub use api::{dispatch_json, query, query_json, DispatchSummary, ViewRequest};
pub use session::{Action, DashboardSession, DispatchOutcome, MemoCounters, SelectionSnapshot};

/// System integration errors
#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Data error: {0}")]
    Data(#[from] GovMapError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IntegrationError>;

impl From<IntegrationError> for GovMapError {
    fn from(error: IntegrationError) -> Self {
        match error {
            IntegrationError::Config(e) => GovMapError::InvalidConfig {
                message: e.to_string(),
                field: None,
            },
            IntegrationError::Data(e) => e,
            IntegrationError::Serialization(e) => GovMapError::InvalidRequest {
                message: e.to_string(),
            },
        }
    }
}

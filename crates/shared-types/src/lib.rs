//! Shared types for the GovMap dashboard
//!
//! This crate contains the governance data model, the error taxonomy, input
//! events and the selection state shared between the data-manager, renderer,
//! system-integration and wasm-bridge crates.

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use tsify::Tsify;

pub mod data_types;
pub mod errors;
pub mod events;
pub mod store_state;

pub use data_types::{
    CategoryRatios, ChainId, ChainSummary, Cluster, CoordinateKind, Proposal, ProposalId,
    ProposalSet, ProposalStatus, Rate, ValidatorId, VoteOption, VoteRatios, VoteRecord,
};
pub use errors::{GovMapError, GovMapResult};

/// Inclusive time range in epoch milliseconds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "typescript", derive(Tsify))]
pub struct TimeRange {
    pub start: u64,
    pub end: u64,
}

impl TimeRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn contains(&self, timestamp: u64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }

    /// Swap the bounds if they arrive reversed (slider handles crossing)
    pub fn normalized(self) -> Self {
        if self.start <= self.end {
            self
        } else {
            Self {
                start: self.end,
                end: self.start,
            }
        }
    }
}

//! Data layer for the governance dashboard
//! Loads the pre-computed datasets into immutable snapshots and derives
//! validator statistics from them.

pub mod aggregation;
pub mod data_store;
pub mod manager;
pub mod parser;
pub mod proposal_view;
pub mod validator_table;

pub use aggregation::{
    chain_metrics, compare_validators, compute_validator_stats, ChainMetrics, MatchRateInput,
    ProposalComparisonRow, ValidatorComparison, ValidatorStats,
};
pub use data_store::{
    ChainPoint, ChainStore, CoordinateSnapshot, CoordinateStore, GlobalPoint, LoadTicket,
    ProposalStore, ValidatorVotes, VotingPatternStore, VotingTable,
};
pub use manager::{
    ChainLoadOutcome, DataManager, DataManagerStats, DataSource, LoadReport, SegmentOutcome,
};
pub use parser::ParseReport;
pub use proposal_view::{proposal_list, ProposalListView, ProposalQuery, ProposalSummary};
pub use validator_table::{build_validator_rows, RankLabel, TableOrdering, ValidatorRow};

//! In-memory stores publishing immutable snapshots of the loaded datasets
//!
//! Each store hands out `Arc` snapshots; replacing a snapshot never mutates
//! one a reader already holds. Loads are ticketed per chain so that a result
//! from a superseded request is dropped instead of overwriting newer data.

use govmap_shared::store_state::ProposalCatalog;
use govmap_shared::{
    CategoryRatios, ChainId, ChainSummary, Cluster, CoordinateKind, ProposalId, ProposalSet,
    ValidatorId, VoteOption, VoteRecord,
};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// A validator's position in the global one-hot projection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalPoint {
    pub voter: ValidatorId,
    pub cluster: Cluster,
    pub x: f64,
    pub y: f64,
}

/// A validator's per-chain cluster and projections
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainPoint {
    pub voter: ValidatorId,
    pub cluster: Cluster,
    pub mds_x: f64,
    pub mds_y: f64,
    pub tsne_x: f64,
    pub tsne_y: f64,
}

impl ChainPoint {
    pub fn position(&self, kind: CoordinateKind) -> (f64, f64) {
        match kind {
            CoordinateKind::Mds => (self.mds_x, self.mds_y),
            CoordinateKind::Tsne => (self.tsne_x, self.tsne_y),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinateSnapshot {
    pub global: Vec<GlobalPoint>,
    pub chains: BTreeMap<ChainId, Vec<ChainPoint>>,
    pub summaries: BTreeMap<ChainId, ChainSummary>,
}

impl CoordinateSnapshot {
    pub fn chain_points(&self, chain: &str) -> &[ChainPoint] {
        self.chains.get(chain).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn chain_ids(&self) -> impl Iterator<Item = &ChainId> {
        self.chains.keys()
    }

    /// Supplied summary, or one derived from the chain's points
    pub fn summary(&self, chain: &str) -> ChainSummary {
        if let Some(summary) = self.summaries.get(chain) {
            return summary.clone();
        }
        let points = self.chain_points(chain);
        let mut cluster_counts = BTreeMap::new();
        for point in points {
            *cluster_counts.entry(point.cluster).or_insert(0) += 1;
        }
        ChainSummary {
            validator_count: points.len(),
            cluster_counts,
        }
    }

    /// For every validator, the set of chains it appears on
    pub fn chain_sets(&self) -> HashMap<ValidatorId, BTreeSet<ChainId>> {
        let mut sets: HashMap<ValidatorId, BTreeSet<ChainId>> = HashMap::new();
        for (chain, points) in &self.chains {
            for point in points {
                sets.entry(point.voter.clone())
                    .or_default()
                    .insert(chain.clone());
            }
        }
        sets
    }
}

/// One validator's votes on a chain
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatorVotes {
    pub category_ratios: CategoryRatios,
    pub proposals: HashMap<ProposalId, VoteRecord>,
}

/// validator → proposal → vote, for one chain
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VotingTable {
    validators: HashMap<ValidatorId, ValidatorVotes>,
}

impl VotingTable {
    pub fn new(validators: HashMap<ValidatorId, ValidatorVotes>) -> Self {
        Self { validators }
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn validator(&self, voter: &str) -> Option<&ValidatorVotes> {
        self.validators.get(voter)
    }

    pub fn contains(&self, voter: &str) -> bool {
        self.validators.contains_key(voter)
    }

    /// Effective option; `None` means no vote was cast
    pub fn vote(&self, voter: &str, proposal: &ProposalId) -> Option<VoteOption> {
        self.validators
            .get(voter)
            .and_then(|v| v.proposals.get(proposal))
            .map(|record| record.option)
    }

    pub fn voters(&self) -> impl Iterator<Item = &ValidatorId> {
        self.validators.keys()
    }
}

/// Identifies one issued load so stale completions can be discarded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub chain: ChainId,
    pub generation: u64,
}

/// Per-chain snapshot store with last-issued-wins commits
#[derive(Debug)]
pub struct ChainStore<T> {
    entries: RwLock<HashMap<ChainId, Arc<T>>>,
    issued: RwLock<HashMap<ChainId, u64>>,
}

impl<T> Default for ChainStore<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            issued: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> ChainStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for a new load of `chain`, superseding older tickets
    pub fn issue_ticket(&self, chain: &str) -> LoadTicket {
        let mut issued = self.issued.write();
        let generation = issued.entry(chain.to_string()).or_insert(0);
        *generation += 1;
        LoadTicket {
            chain: chain.to_string(),
            generation: *generation,
        }
    }

    /// Install `value` if `ticket` is still the newest issued for its chain
    pub fn commit(&self, ticket: &LoadTicket, value: T) -> bool {
        let current = self.issued.read().get(&ticket.chain).copied().unwrap_or(0);
        if ticket.generation < current {
            log::debug!(
                "Discarding stale load of {} (generation {} < {})",
                ticket.chain,
                ticket.generation,
                current
            );
            return false;
        }
        self.entries
            .write()
            .insert(ticket.chain.clone(), Arc::new(value));
        true
    }

    /// Replace a chain's snapshot outright, superseding any in-flight load
    pub fn insert(&self, chain: &str, value: T) {
        let ticket = self.issue_ticket(chain);
        self.commit(&ticket, value);
    }

    pub fn get(&self, chain: &str) -> Option<Arc<T>> {
        self.entries.read().get(chain).cloned()
    }

    pub fn chains(&self) -> Vec<ChainId> {
        let mut chains: Vec<ChainId> = self.entries.read().keys().cloned().collect();
        chains.sort();
        chains
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

/// Per-chain proposal metadata
pub type ProposalStore = ChainStore<ProposalSet>;

/// Per-chain validator → proposal → vote tables
pub type VotingPatternStore = ChainStore<VotingTable>;

impl ProposalCatalog for ProposalStore {
    fn proposal_set(&self, chain: &str) -> Option<Arc<ProposalSet>> {
        self.get(chain)
    }
}

/// Single-slot store for the coordinate dataset
#[derive(Debug, Default)]
pub struct CoordinateStore {
    inner: ChainStore<CoordinateSnapshot>,
}

impl CoordinateStore {
    const SLOT: &'static str = "coordinates";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue_ticket(&self) -> LoadTicket {
        self.inner.issue_ticket(Self::SLOT)
    }

    pub fn commit(&self, ticket: &LoadTicket, snapshot: CoordinateSnapshot) -> bool {
        self.inner.commit(ticket, snapshot)
    }

    pub fn insert(&self, snapshot: CoordinateSnapshot) {
        self.inner.insert(Self::SLOT, snapshot)
    }

    /// Current snapshot; empty until the dataset has loaded
    pub fn snapshot(&self) -> Arc<CoordinateSnapshot> {
        self.inner.get(Self::SLOT).unwrap_or_default()
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.get(Self::SLOT).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(voter: &str, cluster: u8) -> ChainPoint {
        ChainPoint {
            voter: voter.to_string(),
            cluster: Cluster::new(cluster).unwrap(),
            mds_x: 0.0,
            mds_y: 0.0,
            tsne_x: 1.0,
            tsne_y: 2.0,
        }
    }

    #[test]
    fn test_stale_ticket_is_discarded() {
        let store: ProposalStore = ChainStore::new();
        let first = store.issue_ticket("cosmos");
        let second = store.issue_ticket("cosmos");

        assert!(store.commit(&second, ProposalSet::default()));
        assert!(!store.commit(&first, ProposalSet::default()));
        assert!(store.get("cosmos").is_some());
    }

    #[test]
    fn test_tickets_are_per_chain() {
        let store: VotingPatternStore = ChainStore::new();
        let cosmos = store.issue_ticket("cosmos");
        let _juno = store.issue_ticket("juno");
        assert!(store.commit(&cosmos, VotingTable::default()));
        assert_eq!(store.chains(), vec!["cosmos".to_string()]);
    }

    #[test]
    fn test_summary_derived_when_missing() {
        let snapshot = CoordinateSnapshot {
            chains: BTreeMap::from([(
                "cosmos".to_string(),
                vec![point("a", 1), point("b", 1), point("c", 4)],
            )]),
            ..CoordinateSnapshot::default()
        };
        let summary = snapshot.summary("cosmos");
        assert_eq!(summary.validator_count, 3);
        assert_eq!(summary.cluster_counts[&Cluster::new(1).unwrap()], 2);
        assert_eq!(snapshot.summary("juno").validator_count, 0);
    }

    #[test]
    fn test_chain_sets() {
        let snapshot = CoordinateSnapshot {
            chains: BTreeMap::from([
                ("cosmos".to_string(), vec![point("a", 1), point("b", 2)]),
                ("juno".to_string(), vec![point("a", 3)]),
            ]),
            ..CoordinateSnapshot::default()
        };
        let sets = snapshot.chain_sets();
        assert_eq!(sets["a"].len(), 2);
        assert_eq!(sets["b"], BTreeSet::from(["cosmos".to_string()]));
        assert_eq!(point("a", 1).position(CoordinateKind::Tsne), (1.0, 2.0));
    }

    #[test]
    fn test_coordinate_store_defaults_to_empty() {
        let store = CoordinateStore::new();
        assert!(!store.is_loaded());
        assert!(store.snapshot().global.is_empty());
    }
}

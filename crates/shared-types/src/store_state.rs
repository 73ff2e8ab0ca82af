//! Selection and filter state: the single source of truth for what the user
//! is looking at. Mutated only through [`SelectionState::apply`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::data_types::{ChainId, Cluster, CoordinateKind, ProposalId, ProposalSet, ValidatorId};
use crate::TimeRange;

/// Column the validator table is sorted by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Voter,
    Cluster,
    Participation,
    ProposalMatch,
    #[default]
    OverallMatch,
    ClusterMatch,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Row-highlight filter of the validator table. Rows passing it are listed
/// before rows failing it; an empty filter lets every row pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFilter {
    pub clusters: BTreeSet<Cluster>,
    /// Highlight validators active on exactly the same chains as this one
    pub same_chains_as: Option<ValidatorId>,
}

impl RowFilter {
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty() && self.same_chains_as.is_none()
    }
}

/// Source of per-chain proposal sets for reducers that need proposal timing
pub trait ProposalCatalog {
    fn proposal_set(&self, chain: &str) -> Option<Arc<ProposalSet>>;
}

impl ProposalCatalog for HashMap<ChainId, Arc<ProposalSet>> {
    fn proposal_set(&self, chain: &str) -> Option<Arc<ProposalSet>> {
        self.get(chain).cloned()
    }
}

/// User intent, applied through [`SelectionState::apply`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum SelectionAction {
    /// Focus a chain; selecting the focused chain again returns to the global view
    SelectChain(Option<ChainId>),
    SetSelectedClusters(Vec<Cluster>),
    ToggleCluster(Cluster),
    ClickValidator(ValidatorId),
    Hover(Option<ValidatorId>),
    ClearAll,
    ToggleProposal {
        chain: ChainId,
        id: ProposalId,
    },
    SetProposalSelection {
        chain: ChainId,
        ids: Vec<ProposalId>,
    },
    SelectAllVisible {
        chain: ChainId,
    },
    SetTimeRange {
        chain: ChainId,
        range: TimeRange,
    },
    SetSearch(String),
    SetCoordinateKind(CoordinateKind),
    ToggleEgoNetwork,
    SetRowClusterFilter(Vec<Cluster>),
    SetSameChainFilter(Option<ValidatorId>),
    SetSort(SortSpec),
}

/// What a reducer application changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionChange {
    pub has_changes: bool,
    pub chain_changed: bool,
    pub reference_changed: bool,
    pub comparison_changed: bool,
    pub coordinate_kind_changed: bool,
    pub proposals_changed: bool,
    pub filters_cleared: bool,
    pub requires_viewport_reset: bool,
    pub change_summary: Vec<String>,
}

/// Selection validation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionState {
    pub selected_chain: Option<ChainId>,
    /// Map cluster filter; empty shows every cluster
    pub selected_clusters: BTreeSet<Cluster>,
    pub reference: Option<ValidatorId>,
    pub comparison: Option<ValidatorId>,
    pub hovered: Option<ValidatorId>,
    pub row_filter: RowFilter,
    pub selected_proposals: BTreeMap<ChainId, BTreeSet<ProposalId>>,
    pub time_ranges: BTreeMap<ChainId, TimeRange>,
    pub search: String,
    pub coordinate_kind: CoordinateKind,
    /// Ego-network preference; re-armed whenever the reference changes
    pub ego_enabled: bool,
    pub sort: SortSpec,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            selected_chain: None,
            selected_clusters: BTreeSet::new(),
            reference: None,
            comparison: None,
            hovered: None,
            row_filter: RowFilter::default(),
            selected_proposals: BTreeMap::new(),
            time_ranges: BTreeMap::new(),
            search: String::new(),
            coordinate_kind: CoordinateKind::default(),
            ego_enabled: true,
            sort: SortSpec::default(),
        }
    }
}

impl SelectionState {
    pub fn new(sort: SortSpec) -> Self {
        Self {
            sort,
            ..Self::default()
        }
    }

    /// Apply one action. Any change of reference identity clears the
    /// row-level and cluster filters and re-arms the ego-network preference.
    pub fn apply<C: ProposalCatalog>(
        &mut self,
        action: SelectionAction,
        catalog: &C,
    ) -> SelectionChange {
        let previous = self.clone();

        match action {
            SelectionAction::SelectChain(chain) => {
                self.selected_chain = match chain {
                    Some(id) if self.selected_chain.as_deref() == Some(id.as_str()) => None,
                    other => other,
                };
            }
            SelectionAction::SetSelectedClusters(clusters) => {
                self.selected_clusters = clusters.into_iter().collect();
            }
            SelectionAction::ToggleCluster(cluster) => {
                if !self.selected_clusters.remove(&cluster) {
                    self.selected_clusters.insert(cluster);
                }
            }
            SelectionAction::ClickValidator(voter) => self.click_validator(voter),
            SelectionAction::Hover(voter) => self.hovered = voter,
            SelectionAction::ClearAll => self.clear_all(),
            SelectionAction::ToggleProposal { chain, id } => {
                let selected = self.selected_proposals.entry(chain).or_default();
                if !selected.remove(&id) {
                    selected.insert(id);
                }
            }
            SelectionAction::SetProposalSelection { chain, ids } => {
                self.selected_proposals
                    .insert(chain, ids.into_iter().collect());
            }
            SelectionAction::SelectAllVisible { chain } => {
                if let Some(set) = catalog.proposal_set(&chain) {
                    self.select_all_visible(chain, &set);
                }
            }
            SelectionAction::SetTimeRange { chain, range } => {
                let set = catalog.proposal_set(&chain);
                self.set_time_range(chain, range.normalized(), set.as_deref());
            }
            SelectionAction::SetSearch(term) => self.search = term,
            SelectionAction::SetCoordinateKind(kind) => self.coordinate_kind = kind,
            SelectionAction::ToggleEgoNetwork => self.ego_enabled = !self.ego_enabled,
            SelectionAction::SetRowClusterFilter(clusters) => {
                self.row_filter.clusters = clusters.into_iter().collect();
            }
            SelectionAction::SetSameChainFilter(voter) => self.row_filter.same_chains_as = voter,
            SelectionAction::SetSort(sort) => self.sort = sort,
        }

        if self.reference != previous.reference {
            self.clear_all();
            self.ego_enabled = true;
        }

        self.detect_changes_from(&previous)
    }

    /// Three-slot click state machine: none, reference, reference + comparison
    fn click_validator(&mut self, voter: ValidatorId) {
        if self.reference.as_ref() == Some(&voter) {
            self.reference = None;
            self.comparison = None;
        } else if self.comparison.as_ref() == Some(&voter) {
            self.reference = Some(voter);
            self.comparison = None;
        } else if self.reference.is_none() {
            self.reference = Some(voter);
        } else {
            self.comparison = Some(voter);
        }
    }

    /// Reset row-level filters and the cluster filter
    pub fn clear_all(&mut self) {
        self.row_filter = RowFilter::default();
        self.selected_clusters.clear();
    }

    fn select_all_visible(&mut self, chain: ChainId, set: &ProposalSet) {
        let visible: BTreeSet<ProposalId> = set
            .visible_ids(self.time_ranges.get(&chain), &self.search)
            .into_iter()
            .collect();
        let selected = self.selected_proposals.entry(chain).or_default();
        let all_selected = !visible.is_empty() && visible.is_subset(selected);
        *selected = if all_selected { BTreeSet::new() } else { visible };
    }

    fn set_time_range(&mut self, chain: ChainId, range: TimeRange, set: Option<&ProposalSet>) {
        if let (Some(set), Some(selected)) = (set, self.selected_proposals.get_mut(&chain)) {
            selected.retain(|id| set.start_time(id).is_some_and(|t| range.contains(t)));
        }
        self.time_ranges.insert(chain, range);
    }

    pub fn time_range(&self, chain: &str) -> Option<&TimeRange> {
        self.time_ranges.get(chain)
    }

    pub fn selected_proposal_ids(&self, chain: &str) -> Option<&BTreeSet<ProposalId>> {
        self.selected_proposals.get(chain)
    }

    /// The effective proposal set P for a chain: the user's selection
    /// restricted to known proposals, or every proposal when nothing is selected.
    pub fn effective_proposals(&self, chain: &str, set: &ProposalSet) -> Vec<ProposalId> {
        let selected: Vec<ProposalId> = self
            .selected_proposals
            .get(chain)
            .map(|ids| ids.iter().filter(|id| set.contains(id)).copied().collect())
            .unwrap_or_default();
        if selected.is_empty() {
            set.ids()
        } else {
            selected
        }
    }

    /// Whether the radial ego-network layout applies
    pub fn ego_network_active(&self) -> bool {
        self.selected_chain.is_some()
            && self.reference.is_some()
            && self.comparison.is_none()
            && self.ego_enabled
    }

    pub fn validate(&self) -> SelectionValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.comparison.is_some() && self.reference.is_none() {
            errors.push("Comparison validator set without a reference".to_string());
        }

        if self.comparison.is_some() && self.comparison == self.reference {
            errors.push("Comparison validator equals the reference".to_string());
        }

        for (chain, range) in &self.time_ranges {
            if range.start > range.end {
                errors.push(format!(
                    "Invalid time range for {chain}: start {} > end {}",
                    range.start, range.end
                ));
            }
        }

        if self.selected_chain.is_none() && !self.row_filter.clusters.is_empty() {
            warnings.push("Row cluster filter has no effect in the global view".to_string());
        }

        SelectionValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn detect_changes_from(&self, previous: &SelectionState) -> SelectionChange {
        let mut change_summary = Vec::new();

        let chain_changed = self.selected_chain != previous.selected_chain;
        if chain_changed {
            change_summary.push(format!(
                "Chain changed: {:?} → {:?}",
                previous.selected_chain, self.selected_chain
            ));
        }

        let reference_changed = self.reference != previous.reference;
        if reference_changed {
            change_summary.push(format!(
                "Reference changed: {:?} → {:?}",
                previous.reference, self.reference
            ));
        }

        let comparison_changed = self.comparison != previous.comparison;
        if comparison_changed {
            change_summary.push(format!(
                "Comparison changed: {:?} → {:?}",
                previous.comparison, self.comparison
            ));
        }

        let coordinate_kind_changed = self.coordinate_kind != previous.coordinate_kind;
        if coordinate_kind_changed {
            change_summary.push(format!(
                "Coordinates changed: {:?} → {:?}",
                previous.coordinate_kind, self.coordinate_kind
            ));
        }

        let proposals_changed = self.selected_proposals != previous.selected_proposals;
        if proposals_changed {
            change_summary.push("Proposal selection changed".to_string());
        }

        let filters_cleared = (!previous.row_filter.is_empty() && self.row_filter.is_empty())
            || (!previous.selected_clusters.is_empty() && self.selected_clusters.is_empty());

        SelectionChange {
            has_changes: self != previous,
            chain_changed,
            reference_changed,
            comparison_changed,
            coordinate_kind_changed,
            proposals_changed,
            filters_cleared,
            requires_viewport_reset: chain_changed || coordinate_kind_changed,
            change_summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::{Proposal, ProposalStatus, VoteRatios};

    fn catalog() -> HashMap<ChainId, Arc<ProposalSet>> {
        let proposals = [(1, 1_000), (2, 2_000), (3, 3_000)].map(|(id, start)| Proposal {
            id: ProposalId::new(id),
            title: format!("Proposal {id}"),
            category: "Text".to_string(),
            sub_category: None,
            status: ProposalStatus::Passed,
            time_voting_start: start,
            time_voting_end: start + 500,
            ratios: VoteRatios::default(),
            total_votes: 10,
        });
        HashMap::from([("cosmos".to_string(), Arc::new(ProposalSet::new(proposals)))])
    }

    fn cluster(n: u8) -> Cluster {
        Cluster::new(n).unwrap()
    }

    fn ids(raw: &[u64]) -> BTreeSet<ProposalId> {
        raw.iter().map(|n| ProposalId::new(*n)).collect()
    }

    #[test]
    fn test_select_chain_toggles_back_to_global() {
        let catalog = catalog();
        let mut state = SelectionState::default();

        let change = state.apply(SelectionAction::SelectChain(Some("cosmos".into())), &catalog);
        assert!(change.chain_changed);
        assert!(change.requires_viewport_reset);
        assert_eq!(state.selected_chain.as_deref(), Some("cosmos"));

        state.apply(SelectionAction::SelectChain(Some("cosmos".into())), &catalog);
        assert_eq!(state.selected_chain, None);
    }

    #[test]
    fn test_click_validator_state_machine() {
        let catalog = catalog();
        let mut state = SelectionState::default();

        state.apply(SelectionAction::ClickValidator("a".into()), &catalog);
        assert_eq!(state.reference.as_deref(), Some("a"));

        state.apply(SelectionAction::ClickValidator("b".into()), &catalog);
        assert_eq!(state.comparison.as_deref(), Some("b"));

        // Third validator replaces the comparison
        state.apply(SelectionAction::ClickValidator("c".into()), &catalog);
        assert_eq!(state.reference.as_deref(), Some("a"));
        assert_eq!(state.comparison.as_deref(), Some("c"));

        // Clicking the comparison promotes it
        state.apply(SelectionAction::ClickValidator("c".into()), &catalog);
        assert_eq!(state.reference.as_deref(), Some("c"));
        assert_eq!(state.comparison, None);

        // Clicking the reference clears it
        state.apply(SelectionAction::ClickValidator("c".into()), &catalog);
        assert_eq!(state.reference, None);
        assert_eq!(state.comparison, None);
    }

    #[test]
    fn test_reference_change_clears_filters() {
        let catalog = catalog();
        let mut state = SelectionState::default();
        state.apply(SelectionAction::ClickValidator("a".into()), &catalog);
        state.apply(SelectionAction::SetSelectedClusters(vec![cluster(2)]), &catalog);
        state.apply(SelectionAction::SetRowClusterFilter(vec![cluster(2)]), &catalog);
        state.apply(SelectionAction::SetSameChainFilter(Some("a".into())), &catalog);
        assert_eq!(state.selected_clusters, BTreeSet::from([cluster(2)]));

        // Adding a comparison keeps the reference, so filters survive
        state.apply(SelectionAction::ClickValidator("b".into()), &catalog);
        assert!(!state.row_filter.is_empty());

        let change = state.apply(SelectionAction::ClickValidator("b".into()), &catalog);
        assert!(change.reference_changed);
        assert!(change.filters_cleared);
        assert!(state.selected_clusters.is_empty());
        assert!(state.row_filter.is_empty());
    }

    #[test]
    fn test_ego_preference_rearms_on_reference_change() {
        let catalog = catalog();
        let mut state = SelectionState::default();
        state.apply(SelectionAction::SelectChain(Some("cosmos".into())), &catalog);
        state.apply(SelectionAction::ClickValidator("a".into()), &catalog);
        assert!(state.ego_network_active());

        state.apply(SelectionAction::ToggleEgoNetwork, &catalog);
        assert!(!state.ego_network_active());

        state.apply(SelectionAction::ClickValidator("b".into()), &catalog);
        state.apply(SelectionAction::ClickValidator("b".into()), &catalog);
        assert_eq!(state.reference.as_deref(), Some("b"));
        assert!(state.ego_network_active());

        state.apply(SelectionAction::ClickValidator("c".into()), &catalog);
        assert!(!state.ego_network_active());
    }

    #[test]
    fn test_time_range_prunes_selected_proposals() {
        let catalog = catalog();
        let mut state = SelectionState::default();
        state.apply(
            SelectionAction::SetProposalSelection {
                chain: "cosmos".into(),
                ids: vec![ProposalId::new(1), ProposalId::new(3)],
            },
            &catalog,
        );

        let change = state.apply(
            SelectionAction::SetTimeRange {
                chain: "cosmos".into(),
                range: TimeRange::new(0, 2_500),
            },
            &catalog,
        );

        assert!(change.proposals_changed);
        assert_eq!(state.selected_proposal_ids("cosmos"), Some(&ids(&[1])));
    }

    #[test]
    fn test_select_all_visible_toggles() {
        let catalog = catalog();
        let mut state = SelectionState::default();
        state.apply(
            SelectionAction::SetTimeRange {
                chain: "cosmos".into(),
                range: TimeRange::new(1_500, 3_000),
            },
            &catalog,
        );

        state.apply(SelectionAction::SelectAllVisible { chain: "cosmos".into() }, &catalog);
        assert_eq!(state.selected_proposal_ids("cosmos"), Some(&ids(&[2, 3])));

        state.apply(SelectionAction::SelectAllVisible { chain: "cosmos".into() }, &catalog);
        assert_eq!(state.selected_proposal_ids("cosmos"), Some(&BTreeSet::new()));
    }

    #[test]
    fn test_effective_proposals_defaults_to_full_set() {
        let catalog = catalog();
        let set = catalog.proposal_set("cosmos").unwrap();
        let mut state = SelectionState::default();
        assert_eq!(state.effective_proposals("cosmos", &set).len(), 3);

        state.apply(
            SelectionAction::ToggleProposal {
                chain: "cosmos".into(),
                id: ProposalId::new(2),
            },
            &catalog,
        );
        assert_eq!(
            state.effective_proposals("cosmos", &set),
            vec![ProposalId::new(2)]
        );
    }

    #[test]
    fn test_action_json_shape() {
        let action: SelectionAction = serde_json::from_str(
            r#"{"type":"toggleProposal","payload":{"chain":"cosmos","id":"7"}}"#,
        )
        .unwrap();
        assert_eq!(
            action,
            SelectionAction::ToggleProposal {
                chain: "cosmos".into(),
                id: ProposalId::new(7)
            }
        );

        let unit: SelectionAction = serde_json::from_str(r#"{"type":"clearAll"}"#).unwrap();
        assert_eq!(unit, SelectionAction::ClearAll);
    }

    #[test]
    fn test_validate_flags_inconsistent_slots() {
        let state = SelectionState {
            comparison: Some("b".into()),
            ..SelectionState::default()
        };
        let result = state.validate();
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
    }
}

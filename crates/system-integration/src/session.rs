//! The dashboard session: selection state, viewport and memoized views
//! over the loaded datasets

use crate::memo::Memo;
use crate::Result;
use govmap_config::{DashboardConfig, HotReloadManager};
use govmap_data::{
    build_validator_rows, chain_metrics, compare_validators, compute_validator_stats,
    proposal_list, ChainMetrics, DataManager, LoadReport, MatchRateInput, ProposalListView,
    ProposalQuery, TableOrdering, ValidatorComparison, ValidatorRow, ValidatorStats,
};
use govmap_renderer::{
    hit_test, layout_nodes, Emphasis, LayoutFrame, LayoutInput, LayoutMode, LayoutNode,
    NodeRates, TooltipModel, Viewport,
};
use govmap_shared::events::WindowEvent;
use govmap_shared::store_state::{
    RowFilter, SelectionAction, SelectionChange, SelectionState, SelectionValidationResult,
    SortSpec,
};
use govmap_shared::{ChainId, Cluster, ProposalId, ValidatorId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

const DEFAULT_WIDTH: f64 = 800.0;
const DEFAULT_HEIGHT: f64 = 600.0;

/// Everything that can change the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum Action {
    Selection(SelectionAction),
    Pointer(WindowEvent),
    Resize { width: f64, height: f64 },
    /// Advance viewport transitions
    Tick,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchOutcome {
    pub selection: SelectionChange,
    pub viewport_changed: bool,
}

impl DispatchOutcome {
    pub fn needs_redraw(&self) -> bool {
        self.viewport_changed || self.selection.has_changes
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectionSnapshot {
    #[serde(flatten)]
    pub state: SelectionState,
    pub layout_mode: LayoutMode,
    pub validation: SelectionValidationResult,
    pub data_revision: u64,
}

/// Memoization counters across the derived views
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoCounters {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Clone, PartialEq)]
struct StatsKey {
    generation: u64,
    revision: u64,
    chain: ChainId,
    proposals: Vec<ProposalId>,
    reference: Option<ValidatorId>,
}

#[derive(Debug, Clone, PartialEq)]
struct RowsKey {
    stats: StatsKey,
    comparison: Option<ValidatorId>,
    filter: RowFilter,
    sort: SortSpec,
}

#[derive(Debug, Clone, PartialEq)]
struct NodesKey {
    generation: u64,
    revision: u64,
    mode: LayoutMode,
    chain: Option<ChainId>,
    proposals: Vec<ProposalId>,
    reference: Option<ValidatorId>,
    comparison: Option<ValidatorId>,
    hovered: Option<ValidatorId>,
    clusters: BTreeSet<Cluster>,
    config: Arc<DashboardConfig>,
}

pub struct DashboardSession {
    config: HotReloadManager,
    data: Arc<DataManager>,
    /// Bumped whenever `data` is replaced; revisions restart per manager
    data_generation: u64,
    selection: SelectionState,
    viewport: Viewport,
    stats_memo: Memo<StatsKey, Vec<ValidatorStats>>,
    rows_memo: Memo<RowsKey, Vec<ValidatorRow>>,
    nodes_memo: Memo<NodesKey, Vec<LayoutNode>>,
}

impl DashboardSession {
    pub fn new(config: DashboardConfig) -> Result<Self> {
        let data = Arc::new(DataManager::new(config.data.clone()));
        Self::with_data_manager(config, data)
    }

    pub fn with_data_manager(config: DashboardConfig, data: Arc<DataManager>) -> Result<Self> {
        let selection = SelectionState::new(config.table.default_sort);
        let viewport = Viewport::new(DEFAULT_WIDTH, DEFAULT_HEIGHT, config.viewport);
        Ok(Self {
            config: HotReloadManager::new(config)?,
            data,
            data_generation: 0,
            selection,
            viewport,
            stats_memo: Memo::default(),
            rows_memo: Memo::default(),
            nodes_memo: Memo::default(),
        })
    }

    pub fn config(&self) -> Arc<DashboardConfig> {
        self.config.current()
    }

    pub fn data(&self) -> Arc<DataManager> {
        self.data.clone()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Load every configured dataset; failures degrade their segment only
    pub async fn load(&self) -> LoadReport {
        self.data.load_all().await
    }

    /// Validate and install a new configuration, returning the changed sections
    pub fn update_config(&mut self, config: DashboardConfig) -> Result<Vec<String>> {
        let changed = self.config.update(config)?;
        if !changed.is_empty() {
            self.apply_config(&changed);
        }
        Ok(changed)
    }

    pub fn rollback_config(&mut self, steps: usize) -> Result<()> {
        let before = self.config.current();
        self.config.rollback(steps)?;
        let after = self.config.current();
        let mut changed = Vec::new();
        if before.data != after.data {
            changed.push("data".to_string());
        }
        self.apply_config(&changed);
        Ok(())
    }

    fn apply_config(&mut self, changed: &[String]) {
        let config = self.config.current();
        self.viewport.set_config(config.viewport);
        if changed.iter().any(|section| section == "data") {
            log::info!("Data source changed; datasets must be reloaded");
            self.data = Arc::new(DataManager::new(config.data.clone()));
            self.data_generation += 1;
            self.stats_memo.invalidate();
            self.rows_memo.invalidate();
            self.nodes_memo.invalidate();
        }
    }

    pub fn dispatch(&mut self, action: Action, now_ms: f64) -> DispatchOutcome {
        match action {
            Action::Selection(action) => self.apply_selection(action, now_ms),
            Action::Pointer(event) => self.handle_pointer(&event, now_ms),
            Action::Resize { width, height } => {
                self.viewport.resize(width, height);
                DispatchOutcome {
                    viewport_changed: true,
                    ..DispatchOutcome::default()
                }
            }
            Action::Tick => {
                let was_transitioning = self.viewport.is_transitioning(now_ms);
                self.viewport.tick(now_ms);
                DispatchOutcome {
                    viewport_changed: was_transitioning,
                    ..DispatchOutcome::default()
                }
            }
        }
    }

    fn apply_selection(&mut self, action: SelectionAction, now_ms: f64) -> DispatchOutcome {
        let change = self.selection.apply(action, self.data.proposal_store());
        if change.requires_viewport_reset {
            self.viewport.reset(now_ms);
        }
        if change.has_changes && !change.change_summary.is_empty() {
            log::debug!("Selection updated: {:?}", change.change_summary);
        }
        DispatchOutcome {
            viewport_changed: change.requires_viewport_reset,
            selection: change,
        }
    }

    fn handle_pointer(&mut self, event: &WindowEvent, now_ms: f64) -> DispatchOutcome {
        let response = self.viewport.handle_event(event, now_ms);
        let mut outcome = DispatchOutcome {
            viewport_changed: response.transform_changed,
            ..DispatchOutcome::default()
        };

        if let Some(click) = response.click {
            let nodes = self.nodes();
            let target = hit_test(&nodes, &self.viewport, click.x, click.y, now_ms)
                .map(|n| n.voter.clone());
            if let Some(voter) = target {
                let clicked = self.apply_selection(SelectionAction::ClickValidator(voter), now_ms);
                outcome.viewport_changed |= clicked.viewport_changed;
                outcome.selection = clicked.selection;
            }
        }

        if let Some(position) = response.hover {
            let nodes = self.nodes();
            let hovered = hit_test(&nodes, &self.viewport, position.x, position.y, now_ms)
                .map(|n| n.voter.clone());
            if hovered != self.selection.hovered {
                outcome.selection = self
                    .apply_selection(SelectionAction::Hover(hovered), now_ms)
                    .selection;
            }
        }

        outcome
    }

    /// Effective proposal selection of `chain`
    fn effective_proposals(&self, chain: &str) -> Vec<ProposalId> {
        self.selection.effective_proposals(chain, &self.data.proposals(chain))
    }

    fn stats_key(&self, chain: &str) -> StatsKey {
        StatsKey {
            generation: self.data_generation,
            revision: self.data.revision(),
            chain: chain.to_string(),
            proposals: self.effective_proposals(chain),
            reference: self.selection.reference.clone(),
        }
    }

    /// Match-rate statistics of the selected chain, in coordinate order
    pub fn validator_stats(&mut self) -> Arc<Vec<ValidatorStats>> {
        let Some(chain) = self.selection.selected_chain.clone() else {
            return Arc::default();
        };
        let key = self.stats_key(&chain);
        let data = &self.data;
        self.stats_memo.get_or_compute(key.clone(), || {
            log::debug!(
                "Computing statistics for {} over {} proposal(s)",
                key.chain,
                key.proposals.len()
            );
            let coordinates = data.coordinates();
            let votes = data.voting_table(&key.chain);
            compute_validator_stats(&MatchRateInput {
                validators: coordinates.chain_points(&key.chain),
                votes: &votes,
                proposals: &key.proposals,
                latest: data.proposals(&key.chain).latest_id(),
                reference: key.reference.as_deref(),
            })
        })
    }

    /// Ordered, ranked table rows of the selected chain
    pub fn validator_rows(&mut self) -> Arc<Vec<ValidatorRow>> {
        let Some(chain) = self.selection.selected_chain.clone() else {
            return Arc::default();
        };
        let stats = self.validator_stats();
        let key = RowsKey {
            stats: self.stats_key(&chain),
            comparison: self.selection.comparison.clone(),
            filter: self.selection.row_filter.clone(),
            sort: self.selection.sort,
        };
        let data = &self.data;
        self.rows_memo.get_or_compute(key.clone(), || {
            let chain_sets = data.coordinates().chain_sets();
            build_validator_rows(
                stats.as_ref().clone(),
                &TableOrdering {
                    reference: key.stats.reference.as_deref(),
                    comparison: key.comparison.as_deref(),
                    filter: &key.filter,
                    chain_sets: &chain_sets,
                    sort: key.sort,
                },
            )
        })
    }

    /// Layout mode for the current selection. Ego mode needs the reference
    /// to be present on the selected chain.
    pub fn layout_mode(&self) -> LayoutMode {
        let mode = LayoutMode::resolve(&self.selection);
        match (mode, &self.selection.selected_chain, &self.selection.reference) {
            (LayoutMode::EgoNetwork, Some(chain), Some(reference)) => {
                let coordinates = self.data.coordinates();
                if coordinates
                    .chain_points(chain)
                    .iter()
                    .any(|p| &p.voter == reference)
                {
                    mode
                } else {
                    LayoutMode::ChainProjection(self.selection.coordinate_kind)
                }
            }
            _ => mode,
        }
    }

    fn layout_inputs(&mut self, mode: LayoutMode) -> Vec<LayoutInput> {
        let coordinates = self.data.coordinates();
        let Some(chain) = self.selection.selected_chain.clone() else {
            return coordinates
                .global
                .iter()
                .map(|p| LayoutInput {
                    voter: p.voter.clone(),
                    cluster: p.cluster,
                    x: p.x,
                    y: p.y,
                    rates: NodeRates::default(),
                })
                .collect();
        };

        let stats = self.validator_stats();
        let rates: HashMap<&str, NodeRates> = stats
            .iter()
            .map(|s| {
                (
                    s.voter.as_str(),
                    NodeRates {
                        participation: s.participation,
                        proposal_match: s.proposal_match,
                        overall_match: s.overall_match,
                        cluster_match: s.cluster_match,
                    },
                )
            })
            .collect();
        let kind = match mode {
            LayoutMode::ChainProjection(kind) => kind,
            _ => self.selection.coordinate_kind,
        };

        coordinates
            .chain_points(&chain)
            .iter()
            .map(|p| {
                let (x, y) = p.position(kind);
                LayoutInput {
                    voter: p.voter.clone(),
                    cluster: p.cluster,
                    x,
                    y,
                    rates: rates.get(p.voter.as_str()).copied().unwrap_or_default(),
                }
            })
            .collect()
    }

    /// Laid-out nodes in draw order
    pub fn nodes(&mut self) -> Arc<Vec<LayoutNode>> {
        let mode = self.layout_mode();
        let chain = self.selection.selected_chain.clone();
        let key = NodesKey {
            generation: self.data_generation,
            revision: self.data.revision(),
            mode,
            proposals: chain
                .as_deref()
                .map(|c| self.effective_proposals(c))
                .unwrap_or_default(),
            chain,
            reference: self.selection.reference.clone(),
            comparison: self.selection.comparison.clone(),
            hovered: self.selection.hovered.clone(),
            clusters: self.selection.selected_clusters.clone(),
            config: self.config.current(),
        };
        if let Some(cached) = self.nodes_memo.peek(&key) {
            return cached;
        }

        let inputs = self.layout_inputs(mode);
        self.nodes_memo.get_or_compute(key.clone(), || {
            log::debug!("Laying out {} node(s) in {:?} mode", inputs.len(), key.mode);
            layout_nodes(
                mode,
                &inputs,
                &Emphasis {
                    reference: key.reference.as_deref(),
                    comparison: key.comparison.as_deref(),
                    hovered: key.hovered.as_deref(),
                    cluster_filter: Some(&key.clusters),
                },
                &key.config.layout,
                &key.config.nodes,
            )
        })
    }

    pub fn frame(&mut self, now_ms: f64) -> LayoutFrame {
        let mode = self.layout_mode();
        let nodes = self.nodes();
        LayoutFrame::from_nodes(mode, nodes.as_ref().clone(), &self.viewport, now_ms)
    }

    pub fn tooltip(&mut self, now_ms: f64) -> Option<TooltipModel> {
        let hovered = self.selection.hovered.clone()?;
        let nodes = self.nodes();
        let node = nodes.iter().find(|n| n.voter == hovered)?;
        let chain = self.selection.selected_chain.as_deref();
        let category_ratios = chain
            .and_then(|c| {
                self.data
                    .voting_table(c)
                    .validator(&hovered)
                    .map(|v| v.category_ratios.clone())
            })
            .unwrap_or_default();
        let anchor = self.viewport.unit_to_screen(node.x, node.y, now_ms);
        Some(TooltipModel::new(node, chain, category_ratios, anchor))
    }

    /// Proposal list of the selected chain
    pub fn proposal_view(&self) -> Option<ProposalListView> {
        let chain = self.selection.selected_chain.as_deref()?;
        let proposals = self.data.proposals(chain);
        let votes = self.data.voting_table(chain);
        Some(proposal_list(&ProposalQuery {
            proposals: &proposals,
            votes: Some(&votes),
            selected: self.selection.selected_proposal_ids(chain),
            time_range: self.selection.time_range(chain),
            search: &self.selection.search,
            reference: self.selection.reference.as_deref(),
            comparison: self.selection.comparison.as_deref(),
        }))
    }

    /// Per-proposal breakdown between the reference and the comparison
    pub fn comparison(&self) -> Option<ValidatorComparison> {
        let chain = self.selection.selected_chain.as_deref()?;
        let reference = self.selection.reference.as_deref()?;
        let comparison = self.selection.comparison.as_deref()?;
        let proposals = self.data.proposals(chain);
        Some(compare_validators(
            &self.data.voting_table(chain),
            &proposals,
            &self.effective_proposals(chain),
            reference,
            comparison,
        ))
    }

    pub fn chain_metrics(&self, chain: &str) -> ChainMetrics {
        let coordinates = self.data.coordinates();
        let proposals = self.data.proposals(chain);
        let votes = self.data.voting_table(chain);
        let selection = self.effective_proposals(chain);
        let stats = compute_validator_stats(&MatchRateInput {
            validators: coordinates.chain_points(chain),
            votes: &votes,
            proposals: &selection,
            latest: proposals.latest_id(),
            reference: None,
        });
        chain_metrics(
            chain,
            &coordinates.summary(chain),
            &proposals,
            &selection,
            &stats,
        )
    }

    pub fn all_chain_metrics(&self) -> Vec<ChainMetrics> {
        self.data
            .chains()
            .iter()
            .map(|chain| self.chain_metrics(chain))
            .collect()
    }

    pub fn memo_counters(&self) -> MemoCounters {
        MemoCounters {
            hits: self.stats_memo.hits() + self.rows_memo.hits() + self.nodes_memo.hits(),
            misses: self.stats_memo.misses()
                + self.rows_memo.misses()
                + self.nodes_memo.misses(),
        }
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            state: self.selection.clone(),
            layout_mode: self.layout_mode(),
            validation: self.selection.validate(),
            data_revision: self.data.revision(),
        }
    }
}

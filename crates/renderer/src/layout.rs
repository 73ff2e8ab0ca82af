//! Spatial layout: maps every validator to a point in the unit square

use govmap_config::LayoutConfig;
use govmap_shared::store_state::SelectionState;
use govmap_shared::{Cluster, CoordinateKind, Rate, ValidatorId};
use serde::Serialize;
use std::f64::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "kind", rename_all = "snake_case")]
pub enum LayoutMode {
    /// Global one-hot projection, no chain selected
    Global,
    ChainProjection(CoordinateKind),
    /// Radial layout around the reference validator
    EgoNetwork,
}

impl LayoutMode {
    pub fn resolve(selection: &SelectionState) -> Self {
        match selection.selected_chain {
            None => LayoutMode::Global,
            Some(_) if selection.ego_network_active() => LayoutMode::EgoNetwork,
            Some(_) => LayoutMode::ChainProjection(selection.coordinate_kind),
        }
    }
}

/// Statistics carried by a node for sizing and tooltips
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NodeRates {
    pub participation: Rate,
    pub proposal_match: Rate,
    pub overall_match: Rate,
    pub cluster_match: Rate,
}

/// One validator as seen by the layout engine
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutInput {
    pub voter: ValidatorId,
    pub cluster: Cluster,
    /// Raw projection coordinates for the current mode
    pub x: f64,
    pub y: f64,
    pub rates: NodeRates,
}

/// Min-max rescale one axis into [0, 1] with `padding` of the range added
/// on each side. A degenerate axis maps to 0.5.
fn rescale_axis(values: impl Iterator<Item = f64> + Clone, padding: f64) -> impl Fn(f64) -> f64 {
    let (min, max) = values
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let range = max - min;
    let lo = min - padding * range;
    let span = range * (1.0 + 2.0 * padding);
    move |v| {
        if range.is_finite() && range > 0.0 {
            (v - lo) / span
        } else {
            0.5
        }
    }
}

/// Rescale raw projection coordinates into the unit square
pub fn rescale(inputs: &[LayoutInput], padding: f64) -> Vec<(f64, f64)> {
    let fx = rescale_axis(inputs.iter().map(|n| n.x), padding);
    let fy = rescale_axis(inputs.iter().map(|n| n.y), padding);
    inputs.iter().map(|n| (fx(n.x), fy(n.y))).collect()
}

/// Angle offset within a sector from the voter id's first character, in
/// [-0.5, 0.5) of the jitter span
fn jitter_fraction(voter: &str) -> f64 {
    let code = voter.chars().next().map_or(0, u32::from);
    f64::from(code % 97) / 97.0 - 0.5
}

/// Position of a non-reference validator in the ego network
pub fn ego_position(
    voter: &str,
    cluster: Cluster,
    overall_match: Rate,
    config: &LayoutConfig,
) -> (f64, f64) {
    let agreement = overall_match.value_or(0.0).clamp(0.0, 1.0);
    let radius = config.ego_max_radius * (1.0 - agreement);

    let sectors = usize::from(config.cluster_count.max(1));
    let sector = TAU / sectors as f64;
    let center = (cluster.sector_index() % sectors) as f64 * sector + sector / 2.0;
    let angle = center + jitter_fraction(voter) * config.jitter_span.clamp(0.0, 1.0) * sector;

    (0.5 + radius * angle.cos(), 0.5 + radius * angle.sin())
}

/// Unit-square positions for `inputs` under `mode`, in input order
pub fn compute_positions(
    mode: LayoutMode,
    inputs: &[LayoutInput],
    reference: Option<&str>,
    config: &LayoutConfig,
) -> Vec<(f64, f64)> {
    match mode {
        LayoutMode::Global | LayoutMode::ChainProjection(_) => rescale(inputs, config.padding),
        LayoutMode::EgoNetwork => inputs
            .iter()
            .map(|n| {
                if reference == Some(n.voter.as_str()) {
                    (0.5, 0.5)
                } else {
                    ego_position(&n.voter, n.cluster, n.rates.overall_match, config)
                }
            })
            .collect(),
    }
}

//! Node styling, z-order and GPU instance records

use crate::layout::{compute_positions, LayoutInput, LayoutMode, NodeRates};
use bytemuck::{Pod, Zeroable};
use govmap_config::{LayoutConfig, NodeStyleConfig};
use govmap_shared::{Cluster, ValidatorId};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutNode {
    pub voter: ValidatorId,
    pub cluster: Cluster,
    /// Unit-square position
    pub x: f64,
    pub y: f64,
    /// Radius in container pixels before zoom
    pub radius: f64,
    pub is_reference: bool,
    pub is_comparison: bool,
    pub is_hovered: bool,
    /// In the map cluster filter, or no filter is active
    pub in_selected_cluster: bool,
    pub rates: NodeRates,
}

impl LayoutNode {
    fn z_tier(&self, filter_active: bool) -> u8 {
        if self.is_reference || self.is_comparison || self.is_hovered {
            2
        } else if filter_active && self.in_selected_cluster {
            1
        } else {
            0
        }
    }
}

/// Who is emphasised in the frame
#[derive(Debug, Clone, Copy, Default)]
pub struct Emphasis<'a> {
    pub reference: Option<&'a str>,
    pub comparison: Option<&'a str>,
    pub hovered: Option<&'a str>,
    pub cluster_filter: Option<&'a BTreeSet<Cluster>>,
}

pub fn node_radius(
    mode: LayoutMode,
    rates: &NodeRates,
    is_reference: bool,
    is_comparison: bool,
    style: &NodeStyleConfig,
) -> f64 {
    let base = match mode {
        LayoutMode::Global => style.min_radius,
        _ => {
            let participation = rates.participation.value_or(0.0).clamp(0.0, 1.0);
            style.min_radius + (style.max_radius - style.min_radius) * participation
        }
    };
    if is_reference {
        base + style.reference_bonus
    } else if is_comparison {
        base + style.comparison_bonus
    } else {
        base
    }
}

/// Lay out and style every node, returned in draw order (top-most last)
pub fn layout_nodes(
    mode: LayoutMode,
    inputs: &[LayoutInput],
    emphasis: &Emphasis<'_>,
    layout: &LayoutConfig,
    style: &NodeStyleConfig,
) -> Vec<LayoutNode> {
    let positions = compute_positions(mode, inputs, emphasis.reference, layout);
    let filter = emphasis.cluster_filter.filter(|f| !f.is_empty());

    let mut nodes: Vec<LayoutNode> = inputs
        .iter()
        .zip(positions)
        .map(|(input, (x, y))| {
            let is_reference = emphasis.reference == Some(input.voter.as_str());
            let is_comparison = emphasis.comparison == Some(input.voter.as_str());
            LayoutNode {
                voter: input.voter.clone(),
                cluster: input.cluster,
                x,
                y,
                radius: node_radius(mode, &input.rates, is_reference, is_comparison, style),
                is_reference,
                is_comparison,
                is_hovered: emphasis.hovered == Some(input.voter.as_str()),
                in_selected_cluster: filter.map_or(true, |f| f.contains(&input.cluster)),
                rates: input.rates,
            }
        })
        .collect();

    let filter_active = filter.is_some();
    nodes.sort_by(|a, b| {
        a.z_tier(filter_active)
            .cmp(&b.z_tier(filter_active))
            .then(a.cluster.cmp(&b.cluster))
            .then_with(|| a.voter.cmp(&b.voter))
    });
    nodes
}

pub const FLAG_REFERENCE: u32 = 1;
pub const FLAG_COMPARISON: u32 = 1 << 1;
pub const FLAG_HOVERED: u32 = 1 << 2;
pub const FLAG_DIMMED: u32 = 1 << 3;

/// Per-node record for instanced drawing
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct NodeInstance {
    pub position: [f32; 2],
    pub radius: f32,
    pub cluster: u32,
    pub flags: u32,
    pub _padding: [u32; 3],
}

impl From<&LayoutNode> for NodeInstance {
    fn from(node: &LayoutNode) -> Self {
        let mut flags = 0;
        if node.is_reference {
            flags |= FLAG_REFERENCE;
        }
        if node.is_comparison {
            flags |= FLAG_COMPARISON;
        }
        if node.is_hovered {
            flags |= FLAG_HOVERED;
        }
        if !node.in_selected_cluster {
            flags |= FLAG_DIMMED;
        }
        Self {
            position: [node.x as f32, node.y as f32],
            radius: node.radius as f32,
            cluster: u32::from(node.cluster.number()),
            flags,
            _padding: [0; 3],
        }
    }
}

pub fn instances(nodes: &[LayoutNode]) -> Vec<NodeInstance> {
    nodes.iter().map(NodeInstance::from).collect()
}

/// Raw bytes of `instances`, ready for a vertex buffer upload
pub fn instance_bytes(instances: &[NodeInstance]) -> &[u8] {
    bytemuck::cast_slice(instances)
}

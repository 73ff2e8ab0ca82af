//! Spatial layout engine for the validator map
//!
//! Produces declarative frames: a position and style per node plus the
//! current viewport transform. Drawing them is left to the caller.

pub mod layout;
pub mod nodes;
pub mod tooltip;
pub mod viewport;

use govmap_config::{LayoutConfig, NodeStyleConfig};
use serde::Serialize;

pub use hit_test::hit_test;
pub use layout::{LayoutInput, LayoutMode, NodeRates};
pub use nodes::{instance_bytes, instances, layout_nodes, Emphasis, LayoutNode, NodeInstance};
pub use tooltip::TooltipModel;
pub use viewport::{Transform, Viewport, ViewportResponse};

/// Everything a surface needs to draw the map once
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutFrame {
    pub mode: LayoutMode,
    /// Draw order, top-most last
    pub nodes: Vec<LayoutNode>,
    pub transform: Transform,
    pub width: f64,
    pub height: f64,
    pub transitioning: bool,
}

impl LayoutFrame {
    pub fn build(
        mode: LayoutMode,
        inputs: &[LayoutInput],
        emphasis: &Emphasis<'_>,
        viewport: &Viewport,
        layout: &LayoutConfig,
        style: &NodeStyleConfig,
        now_ms: f64,
    ) -> Self {
        let nodes = layout_nodes(mode, inputs, emphasis, layout, style);
        log::debug!("Laid out {} node(s) in {:?} mode", nodes.len(), mode);
        Self::from_nodes(mode, nodes, viewport, now_ms)
    }

    /// Frame around nodes that were already laid out
    pub fn from_nodes(
        mode: LayoutMode,
        nodes: Vec<LayoutNode>,
        viewport: &Viewport,
        now_ms: f64,
    ) -> Self {
        let (width, height) = viewport.size();
        Self {
            mode,
            nodes,
            transform: viewport.transform_at(now_ms),
            width,
            height,
            transitioning: viewport.is_transitioning(now_ms),
        }
    }

    pub fn node(&self, voter: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.voter == voter)
    }

    pub fn instances(&self) -> Vec<NodeInstance> {
        instances(&self.nodes)
    }
}

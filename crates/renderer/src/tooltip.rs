//! Hover tooltip content

use crate::layout::NodeRates;
use crate::nodes::LayoutNode;
use govmap_shared::{CategoryRatios, ChainId, Cluster, ValidatorId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipModel {
    pub voter: ValidatorId,
    pub cluster: Cluster,
    pub chain: Option<ChainId>,
    #[serde(flatten)]
    pub rates: NodeRates,
    pub category_ratios: CategoryRatios,
    /// Anchor in container pixels
    pub anchor: (f64, f64),
}

impl TooltipModel {
    pub fn new(
        node: &LayoutNode,
        chain: Option<&str>,
        category_ratios: CategoryRatios,
        anchor: (f64, f64),
    ) -> Self {
        Self {
            voter: node.voter.clone(),
            cluster: node.cluster,
            chain: chain.map(str::to_string),
            rates: node.rates,
            category_ratios,
            anchor,
        }
    }

    /// Plain-text lines in display order
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            self.voter.clone(),
            format!("Cluster {}", self.cluster),
            format!("Participation: {}", self.rates.participation),
            format!("Proposal match: {}", self.rates.proposal_match),
            format!("Overall match: {}", self.rates.overall_match),
            format!("Cluster match: {}", self.rates.cluster_match),
        ];
        for (category, ratios) in &self.category_ratios {
            lines.push(format!(
                "{category}: yes {:.0}% / no {:.0}% / veto {:.0}% / abstain {:.0}%",
                ratios.yes * 100.0,
                ratios.no * 100.0,
                ratios.no_with_veto * 100.0,
                ratios.abstain * 100.0
            ));
        }
        lines
    }
}

//! Frame-level layout behaviour

use govmap_config::{LayoutConfig, NodeStyleConfig, ViewportConfig};
use govmap_renderer::{
    hit_test, Emphasis, LayoutFrame, LayoutInput, LayoutMode, NodeRates, Viewport,
};
use govmap_shared::{Cluster, CoordinateKind, Rate};

fn inputs() -> Vec<LayoutInput> {
    [("ref", 1, 0.0, 0.0, 1.0), ("a", 2, 4.0, 2.0, 0.5), ("b", 3, -4.0, 8.0, 0.0)]
        .into_iter()
        .map(|(voter, cluster, x, y, agreement)| LayoutInput {
            voter: voter.to_string(),
            cluster: Cluster::new(cluster).unwrap(),
            x,
            y,
            rates: NodeRates {
                participation: Rate::Value(agreement),
                overall_match: Rate::Value(agreement),
                ..NodeRates::default()
            },
        })
        .collect()
}

#[test]
fn test_ego_frame_centres_reference() {
    let viewport = Viewport::new(400.0, 400.0, ViewportConfig::default());
    let frame = LayoutFrame::build(
        LayoutMode::EgoNetwork,
        &inputs(),
        &Emphasis {
            reference: Some("ref"),
            ..Emphasis::default()
        },
        &viewport,
        &LayoutConfig::default(),
        &NodeStyleConfig::default(),
        0.0,
    );

    let reference = frame.node("ref").unwrap();
    assert_eq!((reference.x, reference.y), (0.5, 0.5));
    assert!(reference.is_reference);
    // Reference renders last
    assert_eq!(frame.nodes.last().unwrap().voter, "ref");
    assert_eq!(hit_test(&frame.nodes, &viewport, 200.0, 200.0, 0.0).unwrap().voter, "ref");
}

#[test]
fn test_projection_frame_serializes() {
    let viewport = Viewport::new(400.0, 300.0, ViewportConfig::default());
    let frame = LayoutFrame::build(
        LayoutMode::ChainProjection(CoordinateKind::Tsne),
        &inputs(),
        &Emphasis::default(),
        &viewport,
        &LayoutConfig::default(),
        &NodeStyleConfig::default(),
        0.0,
    );

    for node in &frame.nodes {
        assert!((0.0..=1.0).contains(&node.x) && (0.0..=1.0).contains(&node.y));
    }
    let json = serde_json::to_value(&frame).unwrap();
    assert_eq!(json["mode"]["mode"], "chain_projection");
    assert_eq!(json["mode"]["kind"], "tsne");
    assert_eq!(json["transform"]["scale"], 1.0);
    assert_eq!(frame.instances().len(), 3);
}

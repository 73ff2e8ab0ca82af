//! End-to-end statistics over parsed datasets

use govmap_data::parser::{parse_coordinates, parse_proposals, parse_voting_patterns};
use govmap_data::{
    build_validator_rows, compute_validator_stats, MatchRateInput, RankLabel, TableOrdering,
};
use govmap_shared::store_state::{RowFilter, SortSpec};
use govmap_shared::Rate;
use std::collections::HashMap;

const COORDINATES: &[u8] = br#"{
    "global": [],
    "chains": {
        "cosmos": [
            {"voter": "R", "cluster": 1, "mds_x": 0, "mds_y": 0, "tsne_x": 0, "tsne_y": 0},
            {"voter": "A", "cluster": 1, "mds_x": 1, "mds_y": 0, "tsne_x": 0, "tsne_y": 0},
            {"voter": "B", "cluster": 2, "mds_x": 0, "mds_y": 1, "tsne_x": 0, "tsne_y": 0}
        ]
    }
}"#;

const PROPOSALS: &[u8] = br#"{
    "1": {"title": "One", "time_voting_start": 1, "time_voting_end": 2},
    "2": {"title": "Two", "time_voting_start": 3, "time_voting_end": 4},
    "3": {"title": "Three", "time_voting_start": 5, "time_voting_end": 6}
}"#;

const VOTES: &[u8] = br#"{
    "R": {"proposals": {"1": {"option": "YES"}, "2": {"option": "YES"}, "3": {"option": "NO"}}},
    "A": {"proposals": {"1": {"option": "YES"}, "2": {"option": "NO"}, "3": {"option": "NO"}}}
}"#;

fn close(rate: Rate, expected: f64) -> bool {
    rate.value().is_some_and(|v| (v - expected).abs() < 1e-9)
}

#[test]
fn test_cosmos_reference_scenario() {
    let coordinates = parse_coordinates("coordinates.json", COORDINATES).unwrap().value;
    let proposals = parse_proposals("proposals/cosmos.json", PROPOSALS).unwrap().value;
    let votes = parse_voting_patterns("voting_patterns/cosmos.json", VOTES).unwrap().value;
    let selection = proposals.ids();

    let stats = compute_validator_stats(&MatchRateInput {
        validators: coordinates.chain_points("cosmos"),
        votes: &votes,
        proposals: &selection,
        latest: proposals.latest_id(),
        reference: Some("R"),
    });
    let by_voter: HashMap<&str, _> = stats.iter().map(|s| (s.voter.as_str(), s)).collect();

    assert!(close(by_voter["A"].participation, 1.0));
    assert!(close(by_voter["B"].participation, 0.0));
    assert!(close(by_voter["A"].proposal_match, 2.0 / 3.0));
    assert!(close(by_voter["A"].overall_match, 2.0 / 3.0));
    assert!(close(by_voter["B"].overall_match, 0.0));

    let filter = RowFilter::default();
    let chain_sets = coordinates.chain_sets();
    let rows = build_validator_rows(
        stats,
        &TableOrdering {
            reference: Some("R"),
            comparison: None,
            filter: &filter,
            chain_sets: &chain_sets,
            sort: SortSpec::default(),
        },
    );
    assert_eq!(rows[0].rank, RankLabel::Reference);
    assert_eq!(rows[1].stats.voter, "A");
    assert_eq!(rows[2].rank, RankLabel::Position(2));

    let json = serde_json::to_value(&rows[0]).unwrap();
    assert_eq!(json["rank"], "P");
    assert_eq!(json["voter"], "R");
    assert!((json["cluster_match"].as_f64().unwrap() - 2.0 / 3.0).abs() < 1e-9);
    let unavailable = serde_json::to_value(&rows[2]).unwrap();
    assert_eq!(unavailable["cluster_match"], "-");
}

#[test]
fn test_missing_chain_yields_no_rows() {
    let coordinates = parse_coordinates("coordinates.json", COORDINATES).unwrap().value;
    let votes = parse_voting_patterns("voting_patterns/juno.json", b"{}").unwrap().value;
    let stats = compute_validator_stats(&MatchRateInput {
        validators: coordinates.chain_points("juno"),
        votes: &votes,
        proposals: &[],
        latest: None,
        reference: Some("R"),
    });
    assert!(stats.is_empty());
}

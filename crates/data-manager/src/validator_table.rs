//! Ordering and ranking of the validator statistics table

use crate::aggregation::ValidatorStats;
use govmap_shared::store_state::{RowFilter, SortDirection, SortField, SortSpec};
use govmap_shared::{ChainId, ValidatorId};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// Rank column: `P` for the reference, `C` for the comparison, else 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankLabel {
    Reference,
    Comparison,
    Position(usize),
}

impl Serialize for RankLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RankLabel::Reference => serializer.serialize_str("P"),
            RankLabel::Comparison => serializer.serialize_str("C"),
            RankLabel::Position(n) => serializer.serialize_u64(*n as u64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatorRow {
    pub rank: RankLabel,
    #[serde(flatten)]
    pub stats: ValidatorStats,
    /// Whether the row passes the active row filter
    pub highlighted: bool,
}

/// Context needed to order rows
#[derive(Debug, Clone, Copy)]
pub struct TableOrdering<'a> {
    pub reference: Option<&'a str>,
    pub comparison: Option<&'a str>,
    pub filter: &'a RowFilter,
    pub chain_sets: &'a HashMap<ValidatorId, BTreeSet<ChainId>>,
    pub sort: SortSpec,
}

impl TableOrdering<'_> {
    /// Row-filter predicate; an empty filter passes everything
    pub fn passes(&self, stats: &ValidatorStats) -> bool {
        if !self.filter.clusters.is_empty() && !self.filter.clusters.contains(&stats.cluster) {
            return false;
        }
        match &self.filter.same_chains_as {
            Some(anchor) => self.chain_sets.get(&stats.voter) == self.chain_sets.get(anchor),
            None => true,
        }
    }

    fn pin(&self, voter: &str) -> u8 {
        if self.reference == Some(voter) {
            0
        } else if self.comparison == Some(voter) {
            1
        } else {
            2
        }
    }
}

fn compare_field(field: SortField, a: &ValidatorStats, b: &ValidatorStats) -> Ordering {
    match field {
        SortField::Voter => a.voter.cmp(&b.voter),
        SortField::Cluster => a.cluster.cmp(&b.cluster),
        SortField::Participation => a
            .participation
            .sort_key()
            .total_cmp(&b.participation.sort_key()),
        SortField::ProposalMatch => a
            .proposal_match
            .sort_key()
            .total_cmp(&b.proposal_match.sort_key()),
        SortField::OverallMatch => a
            .overall_match
            .sort_key()
            .total_cmp(&b.overall_match.sort_key()),
        SortField::ClusterMatch => a
            .cluster_match
            .sort_key()
            .total_cmp(&b.cluster_match.sort_key()),
    }
}

/// Sort `stats` into table order and assign rank labels
pub fn build_validator_rows(
    stats: Vec<ValidatorStats>,
    ordering: &TableOrdering<'_>,
) -> Vec<ValidatorRow> {
    let mut rows: Vec<ValidatorRow> = stats
        .into_iter()
        .map(|stats| ValidatorRow {
            rank: RankLabel::Position(0),
            highlighted: ordering.passes(&stats),
            stats,
        })
        .collect();

    rows.sort_by(|a, b| {
        let by_field = compare_field(ordering.sort.field, &a.stats, &b.stats);
        let by_field = match ordering.sort.direction {
            SortDirection::Ascending => by_field,
            SortDirection::Descending => by_field.reverse(),
        };
        ordering
            .pin(&a.stats.voter)
            .cmp(&ordering.pin(&b.stats.voter))
            .then_with(|| b.highlighted.cmp(&a.highlighted))
            .then(by_field)
            .then_with(|| a.stats.voter.cmp(&b.stats.voter))
    });

    let mut position = 0;
    for row in &mut rows {
        row.rank = match ordering.pin(&row.stats.voter) {
            0 => RankLabel::Reference,
            1 => RankLabel::Comparison,
            _ => {
                position += 1;
                RankLabel::Position(position)
            }
        };
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use govmap_shared::{Cluster, Rate};

    fn stats(voter: &str, cluster: u8, overall: Rate) -> ValidatorStats {
        ValidatorStats {
            voter: voter.to_string(),
            cluster: Cluster::new(cluster).unwrap(),
            participation: Rate::Value(0.5),
            proposal_match: Rate::Unavailable,
            overall_match: overall,
            cluster_match: Rate::Unavailable,
            participated_in_latest: false,
        }
    }

    fn voters(rows: &[ValidatorRow]) -> Vec<&str> {
        rows.iter().map(|r| r.stats.voter.as_str()).collect()
    }

    #[test]
    fn test_reference_and_comparison_pinned() {
        let filter = RowFilter::default();
        let chain_sets = HashMap::new();
        let ordering = TableOrdering {
            reference: Some("r"),
            comparison: Some("c"),
            filter: &filter,
            chain_sets: &chain_sets,
            sort: SortSpec::default(),
        };
        let rows = build_validator_rows(
            vec![
                stats("a", 1, Rate::Value(0.9)),
                stats("c", 1, Rate::Value(0.1)),
                stats("b", 1, Rate::Unavailable),
                stats("r", 1, Rate::Value(1.0)),
                stats("d", 1, Rate::Value(0.0)),
            ],
            &ordering,
        );

        assert_eq!(voters(&rows), vec!["r", "c", "a", "d", "b"]);
        assert_eq!(rows[0].rank, RankLabel::Reference);
        assert_eq!(rows[1].rank, RankLabel::Comparison);
        assert_eq!(rows[2].rank, RankLabel::Position(1));
        assert_eq!(rows[4].rank, RankLabel::Position(3));
    }

    #[test]
    fn test_highlighted_rows_first_and_ties_by_voter() {
        let filter = RowFilter {
            clusters: BTreeSet::from([Cluster::new(2).unwrap()]),
            same_chains_as: None,
        };
        let chain_sets = HashMap::new();
        let ordering = TableOrdering {
            reference: None,
            comparison: None,
            filter: &filter,
            chain_sets: &chain_sets,
            sort: SortSpec {
                field: SortField::OverallMatch,
                direction: SortDirection::Ascending,
            },
        };
        let rows = build_validator_rows(
            vec![
                stats("z", 1, Rate::Value(0.1)),
                stats("y", 2, Rate::Value(0.5)),
                stats("x", 2, Rate::Value(0.5)),
                stats("w", 2, Rate::Unavailable),
            ],
            &ordering,
        );
        assert_eq!(voters(&rows), vec!["w", "x", "y", "z"]);
        assert!(rows[0].highlighted);
        assert!(!rows[3].highlighted);
    }

    #[test]
    fn test_same_chain_filter() {
        let filter = RowFilter {
            clusters: BTreeSet::new(),
            same_chains_as: Some("a".to_string()),
        };
        let chain_sets = HashMap::from([
            ("a".to_string(), BTreeSet::from(["cosmos".to_string()])),
            ("b".to_string(), BTreeSet::from(["cosmos".to_string()])),
            (
                "c".to_string(),
                BTreeSet::from(["cosmos".to_string(), "juno".to_string()]),
            ),
        ]);
        let ordering = TableOrdering {
            reference: None,
            comparison: None,
            filter: &filter,
            chain_sets: &chain_sets,
            sort: SortSpec {
                field: SortField::Voter,
                direction: SortDirection::Descending,
            },
        };
        let rows = build_validator_rows(
            vec![
                stats("a", 1, Rate::Unavailable),
                stats("b", 1, Rate::Unavailable),
                stats("c", 1, Rate::Unavailable),
            ],
            &ordering,
        );
        assert_eq!(voters(&rows), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_rank_serialization() {
        assert_eq!(serde_json::to_string(&RankLabel::Reference).unwrap(), "\"P\"");
        assert_eq!(serde_json::to_string(&RankLabel::Position(4)).unwrap(), "4");
    }
}

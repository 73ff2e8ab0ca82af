//! Match-rate engine: per-validator participation and agreement statistics
//! relative to a reference validator over a proposal selection P.
//!
//! Every function here is pure over its inputs. Empty denominators produce
//! [`Rate::Unavailable`], never NaN.

use crate::data_store::{ChainPoint, ValidatorVotes, VotingTable};
use govmap_shared::{
    ChainId, ChainSummary, Cluster, ProposalId, ProposalSet, ProposalStatus, Rate, ValidatorId,
    VoteOption,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Inputs for one chain's statistics
#[derive(Debug, Clone, Copy)]
pub struct MatchRateInput<'a> {
    pub validators: &'a [ChainPoint],
    pub votes: &'a VotingTable,
    /// Effective proposal selection P, ascending
    pub proposals: &'a [ProposalId],
    /// Numerically highest id of the chain's full proposal set
    pub latest: Option<ProposalId>,
    pub reference: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatorStats {
    pub voter: ValidatorId,
    pub cluster: Cluster,
    pub participation: Rate,
    pub proposal_match: Rate,
    pub overall_match: Rate,
    pub cluster_match: Rate,
    pub participated_in_latest: bool,
}

/// Effective options of one validator over P
type VoteRow = Vec<Option<VoteOption>>;

fn vote_row(votes: Option<&ValidatorVotes>, proposals: &[ProposalId]) -> VoteRow {
    proposals
        .iter()
        .map(|id| votes.and_then(|v| v.proposals.get(id)).map(|r| r.option))
        .collect()
}

pub fn participation(row: &[Option<VoteOption>]) -> Rate {
    Rate::ratio(row.iter().filter(|v| v.is_some()).count(), row.len())
}

/// Agreement over proposals the reference voted on
pub fn proposal_match(row: &[Option<VoteOption>], reference: &[Option<VoteOption>]) -> Rate {
    let mut considered = 0;
    let mut matches = 0;
    for (own, theirs) in row.iter().zip(reference) {
        if let Some(theirs) = theirs {
            considered += 1;
            if own.as_ref() == Some(theirs) {
                matches += 1;
            }
        }
    }
    Rate::ratio(matches, considered)
}

/// Agreement over every proposal, NO_VOTE matching NO_VOTE
pub fn overall_match(row: &[Option<VoteOption>], reference: &[Option<VoteOption>]) -> Rate {
    let matches = row.iter().zip(reference).filter(|(a, b)| a == b).count();
    Rate::ratio(matches, row.len().min(reference.len()))
}

/// Agreement over proposals both validators voted on
pub fn pairwise_agreement(a: &[Option<VoteOption>], b: &[Option<VoteOption>]) -> Rate {
    let mut considered = 0;
    let mut matches = 0;
    for (x, y) in a.iter().zip(b) {
        if let (Some(x), Some(y)) = (x, y) {
            considered += 1;
            if x == y {
                matches += 1;
            }
        }
    }
    Rate::ratio(matches, considered)
}

/// Mean pairwise agreement of each validator with the rest of its cluster
fn cluster_match_rates(
    validators: &[ChainPoint],
    rows: &HashMap<&str, VoteRow>,
) -> HashMap<ValidatorId, Rate> {
    let mut by_cluster: BTreeMap<Cluster, Vec<&str>> = BTreeMap::new();
    for point in validators {
        by_cluster
            .entry(point.cluster)
            .or_default()
            .push(point.voter.as_str());
    }

    let mut rates = HashMap::with_capacity(validators.len());
    for members in by_cluster.values() {
        let mut peer_rates: Vec<Vec<Rate>> = vec![Vec::new(); members.len()];
        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                let rate = pairwise_agreement(&rows[members[i]], &rows[members[j]]);
                peer_rates[i].push(rate);
                peer_rates[j].push(rate);
            }
        }
        for (voter, peers) in members.iter().zip(peer_rates) {
            rates.insert(voter.to_string(), Rate::mean(peers));
        }
    }
    rates
}

/// Statistics for every validator on the chain, in input order
pub fn compute_validator_stats(input: &MatchRateInput<'_>) -> Vec<ValidatorStats> {
    let rows: HashMap<&str, VoteRow> = input
        .validators
        .iter()
        .map(|p| {
            (
                p.voter.as_str(),
                vote_row(input.votes.validator(&p.voter), input.proposals),
            )
        })
        .collect();

    // A reference with no presence on this chain has nothing to compare against
    let reference_row = input
        .reference
        .filter(|r| rows.contains_key(r) || input.votes.contains(r))
        .map(|r| {
            rows.get(r)
                .cloned()
                .unwrap_or_else(|| vote_row(input.votes.validator(r), input.proposals))
        });

    let cluster_rates = cluster_match_rates(input.validators, &rows);

    input
        .validators
        .iter()
        .map(|point| {
            let row = &rows[point.voter.as_str()];
            let (proposal_match, overall_match) = match &reference_row {
                Some(reference) => (proposal_match(row, reference), overall_match(row, reference)),
                None => (Rate::Unavailable, Rate::Unavailable),
            };
            ValidatorStats {
                voter: point.voter.clone(),
                cluster: point.cluster,
                participation: participation(row),
                proposal_match,
                overall_match,
                cluster_match: cluster_rates
                    .get(&point.voter)
                    .copied()
                    .unwrap_or(Rate::Unavailable),
                participated_in_latest: input
                    .latest
                    .is_some_and(|id| input.votes.vote(&point.voter, &id).is_some()),
            }
        })
        .collect()
}

/// One proposal in a reference-versus-comparison breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProposalComparisonRow {
    pub proposal: ProposalId,
    pub title: String,
    pub reference_vote: Option<VoteOption>,
    pub comparison_vote: Option<VoteOption>,
    pub agrees: bool,
    pub both_voted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatorComparison {
    pub reference: ValidatorId,
    pub comparison: ValidatorId,
    pub proposal_match: Rate,
    pub overall_match: Rate,
    pub pairwise_agreement: Rate,
    pub rows: Vec<ProposalComparisonRow>,
}

/// Per-proposal breakdown of how two validators voted over P
pub fn compare_validators(
    votes: &VotingTable,
    proposals: &ProposalSet,
    selection: &[ProposalId],
    reference: &str,
    comparison: &str,
) -> ValidatorComparison {
    let reference_row = vote_row(votes.validator(reference), selection);
    let comparison_row = vote_row(votes.validator(comparison), selection);

    let rows = selection
        .iter()
        .zip(reference_row.iter().zip(&comparison_row))
        .map(|(id, (r, c))| ProposalComparisonRow {
            proposal: *id,
            title: proposals
                .get(id)
                .map(|p| p.title.clone())
                .unwrap_or_default(),
            reference_vote: *r,
            comparison_vote: *c,
            agrees: r == c,
            both_voted: r.is_some() && c.is_some(),
        })
        .collect();

    ValidatorComparison {
        reference: reference.to_string(),
        comparison: comparison.to_string(),
        proposal_match: proposal_match(&comparison_row, &reference_row),
        overall_match: overall_match(&comparison_row, &reference_row),
        pairwise_agreement: pairwise_agreement(&comparison_row, &reference_row),
        rows,
    }
}

/// Participation overview of one chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainMetrics {
    pub chain: ChainId,
    pub validator_count: usize,
    pub cluster_counts: BTreeMap<Cluster, usize>,
    pub proposal_count: usize,
    pub selected_proposal_count: usize,
    pub passed: usize,
    pub rejected: usize,
    pub category_counts: BTreeMap<String, usize>,
    pub mean_participation: Rate,
    pub latest_proposal: Option<ProposalId>,
    pub latest_participation: Rate,
}

pub fn chain_metrics(
    chain: &str,
    summary: &ChainSummary,
    proposals: &ProposalSet,
    selection: &[ProposalId],
    stats: &[ValidatorStats],
) -> ChainMetrics {
    let mut category_counts = BTreeMap::new();
    let mut passed = 0;
    let mut rejected = 0;
    for proposal in proposals.iter() {
        *category_counts.entry(proposal.category.clone()).or_insert(0) += 1;
        match proposal.status {
            ProposalStatus::Passed => passed += 1,
            ProposalStatus::Rejected => rejected += 1,
            ProposalStatus::Other => {}
        }
    }

    let latest_voters = stats.iter().filter(|s| s.participated_in_latest).count();
    let latest_proposal = proposals.latest_id();

    ChainMetrics {
        chain: chain.to_string(),
        validator_count: summary.validator_count.max(stats.len()),
        cluster_counts: summary.cluster_counts.clone(),
        proposal_count: proposals.len(),
        selected_proposal_count: selection.len(),
        passed,
        rejected,
        category_counts,
        mean_participation: Rate::mean(stats.iter().map(|s| s.participation)),
        latest_participation: match latest_proposal {
            Some(_) => Rate::ratio(latest_voters, stats.len()),
            None => Rate::Unavailable,
        },
        latest_proposal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_store::ValidatorVotes;
    use govmap_shared::VoteRecord;

    fn point(voter: &str, cluster: u8) -> ChainPoint {
        ChainPoint {
            voter: voter.to_string(),
            cluster: Cluster::new(cluster).unwrap(),
            mds_x: 0.0,
            mds_y: 0.0,
            tsne_x: 0.0,
            tsne_y: 0.0,
        }
    }

    fn table(entries: &[(&str, &[(u64, VoteOption)])]) -> VotingTable {
        VotingTable::new(
            entries
                .iter()
                .map(|(voter, votes)| {
                    let proposals = votes
                        .iter()
                        .map(|(id, option)| {
                            (
                                ProposalId::new(*id),
                                VoteRecord {
                                    option: *option,
                                    voting_power: 1.0,
                                },
                            )
                        })
                        .collect();
                    (
                        voter.to_string(),
                        ValidatorVotes {
                            proposals,
                            ..ValidatorVotes::default()
                        },
                    )
                })
                .collect(),
        )
    }

    fn ids(raw: &[u64]) -> Vec<ProposalId> {
        raw.iter().copied().map(ProposalId::new).collect()
    }

    fn approx(rate: Rate, expected: f64) -> bool {
        rate.value().is_some_and(|v| (v - expected).abs() < 1e-9)
    }

    use VoteOption::{No, Yes};

    #[test]
    fn test_reference_scenario() {
        let votes = table(&[
            ("R", &[(1, Yes), (2, Yes), (3, No)]),
            ("A", &[(1, Yes), (2, No), (3, No)]),
        ]);
        let validators = vec![point("R", 1), point("A", 1), point("B", 2)];
        let proposals = ids(&[1, 2, 3]);
        let stats = compute_validator_stats(&MatchRateInput {
            validators: &validators,
            votes: &votes,
            proposals: &proposals,
            latest: Some(ProposalId::new(3)),
            reference: Some("R"),
        });

        let a = &stats[1];
        let b = &stats[2];
        assert!(approx(a.participation, 1.0));
        assert!(approx(b.participation, 0.0));
        // A matches R on proposals 1 and 3
        assert!(approx(a.proposal_match, 2.0 / 3.0));
        assert!(approx(a.overall_match, 2.0 / 3.0));
        assert!(approx(b.overall_match, 0.0));
        assert!(approx(b.proposal_match, 0.0));
        assert!(a.participated_in_latest);
        assert!(!b.participated_in_latest);
        assert!(approx(stats[0].overall_match, 1.0));
    }

    #[test]
    fn test_proposal_match_denominator_is_reference_votes() {
        let votes = table(&[
            ("R", &[(1, Yes)]),
            ("A", &[(1, Yes), (2, No), (3, No)]),
        ]);
        let validators = vec![point("R", 1), point("A", 1)];
        let proposals = ids(&[1, 2, 3]);
        let stats = compute_validator_stats(&MatchRateInput {
            validators: &validators,
            votes: &votes,
            proposals: &proposals,
            latest: None,
            reference: Some("R"),
        });

        assert!(approx(stats[1].proposal_match, 1.0));
        assert!(approx(stats[1].overall_match, 1.0 / 3.0));
    }

    #[test]
    fn test_no_vote_matches_no_vote() {
        let votes = table(&[("R", &[(1, Yes)]), ("A", &[(1, Yes)])]);
        let validators = vec![point("R", 1), point("A", 1)];
        let proposals = ids(&[1, 2]);
        let stats = compute_validator_stats(&MatchRateInput {
            validators: &validators,
            votes: &votes,
            proposals: &proposals,
            latest: None,
            reference: Some("R"),
        });
        assert!(approx(stats[1].overall_match, 1.0));
    }

    #[test]
    fn test_empty_selection_yields_sentinels() {
        let votes = table(&[("R", &[(1, Yes)])]);
        let validators = vec![point("R", 1), point("A", 1)];
        let stats = compute_validator_stats(&MatchRateInput {
            validators: &validators,
            votes: &votes,
            proposals: &[],
            latest: Some(ProposalId::new(1)),
            reference: Some("R"),
        });
        for row in &stats {
            assert_eq!(row.participation, Rate::Unavailable);
            assert_eq!(row.proposal_match, Rate::Unavailable);
            assert_eq!(row.overall_match, Rate::Unavailable);
            assert_eq!(row.cluster_match, Rate::Unavailable);
        }
        assert!(stats[0].participated_in_latest);
    }

    #[test]
    fn test_missing_reference_degrades_match_rates() {
        let votes = table(&[("A", &[(1, Yes)])]);
        let validators = vec![point("A", 1)];
        let proposals = ids(&[1]);
        for reference in [None, Some("ghost")] {
            let stats = compute_validator_stats(&MatchRateInput {
                validators: &validators,
                votes: &votes,
                proposals: &proposals,
                latest: None,
                reference,
            });
            assert!(approx(stats[0].participation, 1.0));
            assert_eq!(stats[0].proposal_match, Rate::Unavailable);
            assert_eq!(stats[0].overall_match, Rate::Unavailable);
        }
    }

    #[test]
    fn test_cluster_match_excludes_absent_votes_and_self() {
        let votes = table(&[
            ("A", &[(1, Yes), (2, Yes)]),
            ("B", &[(1, Yes), (2, No)]),
            ("C", &[]),
            ("D", &[(1, No)]),
        ]);
        let validators = vec![point("A", 1), point("B", 1), point("C", 1), point("D", 2)];
        let proposals = ids(&[1, 2]);
        let stats = compute_validator_stats(&MatchRateInput {
            validators: &validators,
            votes: &votes,
            proposals: &proposals,
            latest: None,
            reference: None,
        });

        // A-B agree on 1 of 2; A-C has no comparable votes and is skipped
        assert!(approx(stats[0].cluster_match, 0.5));
        assert!(approx(stats[1].cluster_match, 0.5));
        assert_eq!(stats[2].cluster_match, Rate::Unavailable);
        // D is alone in its cluster
        assert_eq!(stats[3].cluster_match, Rate::Unavailable);
    }

    #[test]
    fn test_recomputation_is_idempotent() {
        let votes = table(&[("R", &[(1, Yes), (2, No)]), ("A", &[(2, No)])]);
        let validators = vec![point("R", 3), point("A", 3)];
        let proposals = ids(&[1, 2]);
        let input = MatchRateInput {
            validators: &validators,
            votes: &votes,
            proposals: &proposals,
            latest: Some(ProposalId::new(2)),
            reference: Some("R"),
        };
        assert_eq!(compute_validator_stats(&input), compute_validator_stats(&input));
    }

    #[test]
    fn test_compare_validators() {
        let votes = table(&[("R", &[(1, Yes), (2, Yes)]), ("C", &[(1, Yes), (3, No)])]);
        let comparison =
            compare_validators(&votes, &ProposalSet::default(), &ids(&[1, 2, 3]), "R", "C");

        assert_eq!(comparison.rows.len(), 3);
        assert!(comparison.rows[0].agrees && comparison.rows[0].both_voted);
        assert!(!comparison.rows[1].agrees);
        assert!(approx(comparison.proposal_match, 0.5));
        assert!(approx(comparison.overall_match, 1.0 / 3.0));
        assert!(approx(comparison.pairwise_agreement, 1.0));
    }

    #[test]
    fn test_chain_metrics() {
        let stats = vec![
            ValidatorStats {
                voter: "a".into(),
                cluster: Cluster::new(1).unwrap(),
                participation: Rate::Value(1.0),
                proposal_match: Rate::Unavailable,
                overall_match: Rate::Unavailable,
                cluster_match: Rate::Unavailable,
                participated_in_latest: true,
            },
            ValidatorStats {
                voter: "b".into(),
                cluster: Cluster::new(2).unwrap(),
                participation: Rate::Value(0.5),
                proposal_match: Rate::Unavailable,
                overall_match: Rate::Unavailable,
                cluster_match: Rate::Unavailable,
                participated_in_latest: false,
            },
        ];
        let metrics = chain_metrics(
            "cosmos",
            &ChainSummary::default(),
            &ProposalSet::default(),
            &[],
            &stats,
        );
        assert_eq!(metrics.validator_count, 2);
        assert!(approx(metrics.mean_participation, 0.75));
        assert_eq!(metrics.latest_participation, Rate::Unavailable);
    }
}

//! Parsers for the coordinate, proposal and voting-pattern datasets
//!
//! A document that is not valid JSON is an error. Individual records that
//! lack expected fields are skipped and counted, so one bad entry never
//! empties a whole chain.

use crate::data_store::{ChainPoint, CoordinateSnapshot, GlobalPoint, ValidatorVotes, VotingTable};
use govmap_shared::{
    CategoryRatios, ChainSummary, Cluster, GovMapError, GovMapResult, Proposal, ProposalId,
    ProposalSet, ProposalStatus, VoteOption, VoteRatios, VoteRecord,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Parsed value plus the number of records that were skipped
#[derive(Debug, Clone, PartialEq)]
pub struct ParseReport<T> {
    pub value: T,
    pub dropped: usize,
}

#[derive(Deserialize)]
struct RawCoordinates {
    #[serde(default)]
    global: Vec<Value>,
    #[serde(default)]
    chains: BTreeMap<String, Vec<Value>>,
    #[serde(default)]
    summary: BTreeMap<String, RawSummary>,
}

#[derive(Deserialize)]
struct RawGlobalPoint {
    #[serde(alias = "voter_id")]
    voter: String,
    cluster: u8,
    x: f64,
    y: f64,
}

#[derive(Deserialize)]
struct RawChainPoint {
    #[serde(alias = "voter_id")]
    voter: String,
    cluster: u8,
    #[serde(alias = "mdsX")]
    mds_x: f64,
    #[serde(alias = "mdsY")]
    mds_y: f64,
    #[serde(alias = "tsneX")]
    tsne_x: f64,
    #[serde(alias = "tsneY")]
    tsne_y: f64,
}

#[derive(Deserialize)]
struct RawSummary {
    #[serde(default)]
    validator_count: usize,
    #[serde(default)]
    cluster_counts: BTreeMap<String, usize>,
}

#[derive(Deserialize)]
struct RawProposal {
    #[serde(default)]
    title: String,
    #[serde(default, rename = "type", alias = "category")]
    category: String,
    #[serde(default, alias = "sub_category")]
    sub_type: Option<String>,
    #[serde(default)]
    status: String,
    time_voting_start: u64,
    time_voting_end: u64,
    #[serde(default)]
    yes_ratio: f64,
    #[serde(default)]
    no_ratio: f64,
    #[serde(default)]
    no_with_veto_ratio: f64,
    #[serde(default)]
    abstain_ratio: f64,
    #[serde(default)]
    total_votes: u64,
}

#[derive(Deserialize)]
struct RawValidatorVotes {
    #[serde(default)]
    category_ratios: CategoryRatios,
    #[serde(default)]
    proposals: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct RawVote {
    option: String,
    #[serde(default)]
    voting_power: f64,
}

fn document<T: DeserializeOwned>(resource: &str, bytes: &[u8]) -> GovMapResult<T> {
    serde_json::from_slice(bytes).map_err(|e| GovMapError::DataParse {
        resource: resource.to_string(),
        message: e.to_string(),
    })
}

fn record<T: DeserializeOwned>(resource: &str, key: &str, value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            log::warn!("Skipping malformed record {key} in {resource}: {e}");
            None
        }
    }
}

fn cluster(resource: &str, key: &str, raw: u8) -> Option<Cluster> {
    let cluster = Cluster::new(raw);
    if cluster.is_none() {
        log::warn!("Skipping {key} in {resource}: cluster {raw} out of range");
    }
    cluster
}

pub fn parse_coordinates(
    resource: &str,
    bytes: &[u8],
) -> GovMapResult<ParseReport<CoordinateSnapshot>> {
    let raw: RawCoordinates = document(resource, bytes)?;
    let mut dropped = 0;

    let mut global = Vec::with_capacity(raw.global.len());
    for (index, value) in raw.global.into_iter().enumerate() {
        let key = format!("global[{index}]");
        let point = record::<RawGlobalPoint>(resource, &key, value).and_then(|p| {
            let cluster = cluster(resource, &key, p.cluster)?;
            (p.x.is_finite() && p.y.is_finite()).then(|| GlobalPoint {
                voter: p.voter,
                cluster,
                x: p.x,
                y: p.y,
            })
        });
        match point {
            Some(point) => global.push(point),
            None => dropped += 1,
        }
    }

    let mut chains = BTreeMap::new();
    for (chain, values) in raw.chains {
        let mut points = Vec::with_capacity(values.len());
        for (index, value) in values.into_iter().enumerate() {
            let key = format!("{chain}[{index}]");
            let point = record::<RawChainPoint>(resource, &key, value).and_then(|p| {
                let cluster = cluster(resource, &key, p.cluster)?;
                [p.mds_x, p.mds_y, p.tsne_x, p.tsne_y]
                    .iter()
                    .all(|v| v.is_finite())
                    .then(|| ChainPoint {
                        voter: p.voter,
                        cluster,
                        mds_x: p.mds_x,
                        mds_y: p.mds_y,
                        tsne_x: p.tsne_x,
                        tsne_y: p.tsne_y,
                    })
            });
            match point {
                Some(point) => points.push(point),
                None => dropped += 1,
            }
        }
        chains.insert(chain, points);
    }

    let summaries = raw
        .summary
        .into_iter()
        .map(|(chain, summary)| {
            let cluster_counts = summary
                .cluster_counts
                .into_iter()
                .filter_map(|(label, count)| {
                    let cluster = label.trim().parse().ok().and_then(Cluster::new)?;
                    Some((cluster, count))
                })
                .collect();
            (
                chain,
                ChainSummary {
                    validator_count: summary.validator_count,
                    cluster_counts,
                },
            )
        })
        .collect();

    Ok(ParseReport {
        value: CoordinateSnapshot {
            global,
            chains,
            summaries,
        },
        dropped,
    })
}

pub fn parse_proposals(resource: &str, bytes: &[u8]) -> GovMapResult<ParseReport<ProposalSet>> {
    let raw: BTreeMap<String, Value> = document(resource, bytes)?;
    let mut dropped = 0;
    let mut proposals = Vec::with_capacity(raw.len());

    for (key, value) in raw {
        let Ok(id) = key.parse::<ProposalId>() else {
            log::warn!("Skipping proposal with non-numeric id {key:?} in {resource}");
            dropped += 1;
            continue;
        };
        let Some(p) = record::<RawProposal>(resource, &key, value) else {
            dropped += 1;
            continue;
        };
        if p.time_voting_start > p.time_voting_end {
            log::warn!(
                "Skipping proposal {key} in {resource}: voting window ends before it starts"
            );
            dropped += 1;
            continue;
        }
        proposals.push(Proposal {
            id,
            title: p.title,
            category: p.category,
            sub_category: p.sub_type.filter(|s| !s.is_empty()),
            status: ProposalStatus::parse(&p.status),
            time_voting_start: p.time_voting_start,
            time_voting_end: p.time_voting_end,
            ratios: VoteRatios {
                yes: p.yes_ratio,
                no: p.no_ratio,
                no_with_veto: p.no_with_veto_ratio,
                abstain: p.abstain_ratio,
            },
            total_votes: p.total_votes,
        });
    }

    Ok(ParseReport {
        value: ProposalSet::new(proposals),
        dropped,
    })
}

pub fn parse_voting_patterns(
    resource: &str,
    bytes: &[u8],
) -> GovMapResult<ParseReport<VotingTable>> {
    let raw: HashMap<String, Value> = document(resource, bytes)?;
    let mut dropped = 0;
    let mut validators = HashMap::with_capacity(raw.len());

    for (voter, value) in raw {
        let Some(entry) = record::<RawValidatorVotes>(resource, &voter, value) else {
            dropped += 1;
            continue;
        };

        let mut proposals = HashMap::with_capacity(entry.proposals.len());
        for (key, value) in entry.proposals {
            let record_key = format!("{voter}/{key}");
            let vote = key.parse::<ProposalId>().ok().zip(
                record::<RawVote>(resource, &record_key, value)
                    .and_then(|v| Some((v.option.parse::<VoteOption>().ok()?, v.voting_power))),
            );
            match vote {
                Some((id, (option, voting_power))) => {
                    proposals.insert(
                        id,
                        VoteRecord {
                            option,
                            voting_power,
                        },
                    );
                }
                None => {
                    log::warn!("Skipping vote {record_key} in {resource}");
                    dropped += 1;
                }
            }
        }

        validators.insert(
            voter,
            ValidatorVotes {
                category_ratios: entry.category_ratios,
                proposals,
            },
        );
    }

    Ok(ParseReport {
        value: VotingTable::new(validators),
        dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinates_skips_bad_points() {
        let json = br#"{
            "global": [
                {"voter": "a", "cluster": 1, "x": 0.1, "y": 0.2},
                {"voter": "b", "cluster": 9, "x": 0.1, "y": 0.2},
                {"voter": "c", "x": 0.1}
            ],
            "chains": {
                "cosmos": [{"voter": "a", "cluster": 2, "mds_x": 1, "mds_y": 2, "tsne_x": 3, "tsne_y": 4}]
            },
            "summary": {"cosmos": {"validator_count": 1, "cluster_counts": {"2": 1, "x": 4}}}
        }"#;

        let report = parse_coordinates("coordinates.json", json).unwrap();
        assert_eq!(report.dropped, 2);
        assert_eq!(report.value.global.len(), 1);
        assert_eq!(report.value.chain_points("cosmos")[0].tsne_y, 4.0);
        let summary = report.value.summary("cosmos");
        assert_eq!(summary.cluster_counts.len(), 1);
    }

    #[test]
    fn test_parse_proposals() {
        let json = br#"{
            "12": {"title": "Upgrade", "type": "SoftwareUpgrade", "sub_type": "", "status": "PROPOSAL_STATUS_PASSED",
                   "time_voting_start": 100, "time_voting_end": 200, "yes_ratio": 0.9, "total_votes": 40},
            "13": {"title": "Broken window", "time_voting_start": 300, "time_voting_end": 200},
            "abc": {"title": "Bad id", "time_voting_start": 1, "time_voting_end": 2},
            "14": {"title": "Missing timing"}
        }"#;

        let report = parse_proposals("proposals/cosmos.json", json).unwrap();
        assert_eq!(report.dropped, 3);
        let proposal = report.value.get(&ProposalId::new(12)).unwrap();
        assert_eq!(proposal.status, ProposalStatus::Passed);
        assert_eq!(proposal.category, "SoftwareUpgrade");
        assert_eq!(proposal.sub_category, None);
        assert_eq!(proposal.ratios.yes, 0.9);
    }

    #[test]
    fn test_parse_voting_patterns() {
        let json = br#"{
            "val-a": {
                "category_ratios": {"Text": {"yes": 1.0}},
                "proposals": {
                    "1": {"option": "VOTE_OPTION_YES", "voting_power": 12.5},
                    "2": {"option": "MAYBE"},
                    "3": {"voting_power": 1.0}
                }
            },
            "val-b": {"proposals": {"1": {"option": "NO"}}}
        }"#;

        let report = parse_voting_patterns("voting_patterns/cosmos.json", json).unwrap();
        assert_eq!(report.dropped, 2);
        let table = report.value;
        assert_eq!(table.vote("val-a", &ProposalId::new(1)), Some(VoteOption::Yes));
        assert_eq!(table.vote("val-a", &ProposalId::new(2)), None);
        assert_eq!(table.vote("val-b", &ProposalId::new(1)), Some(VoteOption::No));
        assert_eq!(table.validator("val-a").unwrap().category_ratios["Text"].yes, 1.0);
    }

    #[test]
    fn test_invalid_document_is_an_error() {
        let err = parse_proposals("proposals/cosmos.json", b"not json").unwrap_err();
        assert!(matches!(err, GovMapError::DataParse { .. }));
    }
}

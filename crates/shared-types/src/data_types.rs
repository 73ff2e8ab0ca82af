//! Governance data model shared across the system

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::TimeRange;

#[cfg(feature = "typescript")]
use tsify::Tsify;

/// Chain key, e.g. "cosmos"
pub type ChainId = String;

/// Stable voter identifier of a validator
pub type ValidatorId = String;

/// Numeric proposal identifier, scoped to a chain.
///
/// Serialized as a string to match the dataset keys; accepts either a string
/// or an integer on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProposalId(u64);

impl ProposalId {
    pub fn new(number: u64) -> Self {
        Self(number)
    }

    pub fn number(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProposalId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(ProposalId)
    }
}

impl Serialize for ProposalId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ProposalId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(ProposalId(n)),
            Raw::Text(s) => s
                .parse()
                .map_err(|_| de::Error::custom(format!("non-numeric proposal id: {s}"))),
        }
    }
}

/// Behavioural cluster label, one of 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Cluster(u8);

impl Cluster {
    pub const COUNT: u8 = 5;

    pub fn new(number: u8) -> Option<Self> {
        (1..=Self::COUNT).contains(&number).then_some(Self(number))
    }

    pub fn number(&self) -> u8 {
        self.0
    }

    /// Zero-based index of this cluster's sector in radial layouts
    pub fn sector_index(&self) -> usize {
        (self.0 - 1) as usize
    }

    pub fn all() -> impl Iterator<Item = Cluster> {
        (1..=Self::COUNT).map(Cluster)
    }
}

impl TryFrom<u8> for Cluster {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Cluster::new(value).ok_or_else(|| format!("cluster out of range: {value}"))
    }
}

impl From<Cluster> for u8 {
    fn from(cluster: Cluster) -> Self {
        cluster.0
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Option chosen on a proposal. "No vote cast" is modelled as the absence of
/// a record (`Option<VoteOption>::None`), never as a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(Tsify))]
pub enum VoteOption {
    #[serde(rename = "YES", alias = "VOTE_OPTION_YES")]
    Yes,
    #[serde(rename = "NO", alias = "VOTE_OPTION_NO")]
    No,
    #[serde(rename = "NO_WITH_VETO", alias = "VOTE_OPTION_NO_WITH_VETO")]
    NoWithVeto,
    #[serde(rename = "ABSTAIN", alias = "VOTE_OPTION_ABSTAIN")]
    Abstain,
}

impl VoteOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteOption::Yes => "YES",
            VoteOption::No => "NO",
            VoteOption::NoWithVeto => "NO_WITH_VETO",
            VoteOption::Abstain => "ABSTAIN",
        }
    }

    /// Label for an effective option, where `None` is the synthetic NO_VOTE
    pub fn label(option: Option<VoteOption>) -> &'static str {
        option.map_or("NO_VOTE", |o| o.as_str())
    }
}

impl FromStr for VoteOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let bare = upper.strip_prefix("VOTE_OPTION_").unwrap_or(&upper);
        match bare {
            "YES" => Ok(VoteOption::Yes),
            "NO" => Ok(VoteOption::No),
            "NO_WITH_VETO" | "NOWITHVETO" => Ok(VoteOption::NoWithVeto),
            "ABSTAIN" => Ok(VoteOption::Abstain),
            _ => Err(format!("unknown vote option: {s}")),
        }
    }
}

/// A single cast vote
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub option: VoteOption,
    #[serde(default)]
    pub voting_power: f64,
}

/// Final (or aggregated) vote distribution
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VoteRatios {
    #[serde(default)]
    pub yes: f64,
    #[serde(default)]
    pub no: f64,
    #[serde(default)]
    pub no_with_veto: f64,
    #[serde(default)]
    pub abstain: f64,
}

/// Per-category aggregated vote ratios of one validator
pub type CategoryRatios = BTreeMap<String, VoteRatios>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Passed,
    Rejected,
    #[default]
    Other,
}

impl ProposalStatus {
    pub fn parse(raw: &str) -> Self {
        let upper = raw.trim().to_ascii_uppercase();
        match upper.strip_prefix("PROPOSAL_STATUS_").unwrap_or(&upper) {
            "PASSED" => ProposalStatus::Passed,
            "REJECTED" => ProposalStatus::Rejected,
            _ => ProposalStatus::Other,
        }
    }
}

/// Proposal metadata. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub category: String,
    pub sub_category: Option<String>,
    pub status: ProposalStatus,
    pub time_voting_start: u64,
    pub time_voting_end: u64,
    pub ratios: VoteRatios,
    pub total_votes: u64,
}

impl Proposal {
    pub fn starts_within(&self, range: &TimeRange) -> bool {
        range.contains(self.time_voting_start)
    }

    /// Case-insensitive match against id, title and categories.
    /// An empty term matches everything.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return true;
        }
        let needle = term.to_lowercase();
        self.id.to_string() == needle
            || self.title.to_lowercase().contains(&needle)
            || self.category.to_lowercase().contains(&needle)
            || self
                .sub_category
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains(&needle))
    }
}

/// A chain's proposals ordered by numeric id
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProposalSet {
    proposals: BTreeMap<ProposalId, Proposal>,
}

impl ProposalSet {
    pub fn new(proposals: impl IntoIterator<Item = Proposal>) -> Self {
        Self {
            proposals: proposals.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn get(&self, id: &ProposalId) -> Option<&Proposal> {
        self.proposals.get(id)
    }

    pub fn contains(&self, id: &ProposalId) -> bool {
        self.proposals.contains_key(id)
    }

    /// Proposals in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    pub fn ids(&self) -> Vec<ProposalId> {
        self.proposals.keys().copied().collect()
    }

    /// Numerically highest id
    pub fn latest_id(&self) -> Option<ProposalId> {
        self.proposals.keys().next_back().copied()
    }

    pub fn start_time(&self, id: &ProposalId) -> Option<u64> {
        self.proposals.get(id).map(|p| p.time_voting_start)
    }

    /// Span of voting start times, used as the default slider extent
    pub fn time_bounds(&self) -> Option<TimeRange> {
        let starts = self.proposals.values().map(|p| p.time_voting_start);
        let min = starts.clone().min()?;
        let max = starts.max()?;
        Some(TimeRange::new(min, max))
    }

    /// Ids whose voting start lies in `range` (if any) and that match `search`
    pub fn visible_ids(&self, range: Option<&TimeRange>, search: &str) -> Vec<ProposalId> {
        self.proposals
            .values()
            .filter(|p| range.map_or(true, |r| p.starts_within(r)))
            .filter(|p| p.matches_search(search))
            .map(|p| p.id)
            .collect()
    }
}

/// Per-chain summary supplied with the coordinate dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainSummary {
    pub validator_count: usize,
    pub cluster_counts: BTreeMap<Cluster, usize>,
}

/// Which per-chain projection to display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(Tsify))]
#[serde(rename_all = "lowercase")]
pub enum CoordinateKind {
    #[default]
    Mds,
    Tsne,
}

/// A fraction in [0, 1], or unavailable (rendered "-") when its denominator
/// is zero or its inputs are missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Rate {
    Value(f64),
    #[default]
    Unavailable,
}

impl Rate {
    pub fn ratio(numerator: usize, denominator: usize) -> Self {
        if denominator == 0 {
            Rate::Unavailable
        } else {
            Rate::Value(numerator as f64 / denominator as f64)
        }
    }

    /// Arithmetic mean of the available rates; unavailable if there are none
    pub fn mean(rates: impl IntoIterator<Item = Rate>) -> Self {
        let (sum, count) = rates
            .into_iter()
            .filter_map(Rate::value)
            .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
        if count == 0 {
            Rate::Unavailable
        } else {
            Rate::Value(sum / count as f64)
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Rate::Value(v) => Some(v),
            Rate::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Rate::Value(_))
    }

    /// Sorting key: unavailable sorts as -1, below every real rate
    pub fn sort_key(self) -> f64 {
        self.value().unwrap_or(-1.0)
    }

    pub fn value_or(self, default: f64) -> f64 {
        self.value().unwrap_or(default)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rate::Value(v) => write!(f, "{:.1}%", v * 100.0),
            Rate::Unavailable => write!(f, "-"),
        }
    }
}

impl Serialize for Rate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Rate::Value(v) => serializer.serialize_f64(*v),
            Rate::Unavailable => serializer.serialize_str("-"),
        }
    }
}

impl<'de> Deserialize<'de> for Rate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(v) => Ok(Rate::Value(v)),
            Raw::Text(s) if s == "-" => Ok(Rate::Unavailable),
            Raw::Text(s) => Err(de::Error::custom(format!("invalid rate: {s}"))),
        }
    }
}

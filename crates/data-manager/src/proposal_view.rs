//! Proposal list for the selected chain, newest first

use crate::data_store::VotingTable;
use govmap_shared::{
    ProposalId, ProposalSet, ProposalStatus, TimeRange, VoteOption, VoteRatios,
};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProposalSummary {
    pub id: ProposalId,
    pub title: String,
    pub category: String,
    pub sub_category: Option<String>,
    pub status: ProposalStatus,
    pub time_voting_start: u64,
    pub time_voting_end: u64,
    pub ratios: VoteRatios,
    pub total_votes: u64,
    pub selected: bool,
    pub reference_vote: Option<VoteOption>,
    pub comparison_vote: Option<VoteOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProposalListView {
    /// Extent of the time slider
    pub time_bounds: Option<TimeRange>,
    pub time_range: Option<TimeRange>,
    pub total: usize,
    pub selected_count: usize,
    /// Every visible proposal is selected (select-all toggles to none)
    pub all_visible_selected: bool,
    /// Visible proposals in descending id order
    pub proposals: Vec<ProposalSummary>,
}

pub struct ProposalQuery<'a> {
    pub proposals: &'a ProposalSet,
    pub votes: Option<&'a VotingTable>,
    pub selected: Option<&'a BTreeSet<ProposalId>>,
    pub time_range: Option<&'a TimeRange>,
    pub search: &'a str,
    pub reference: Option<&'a str>,
    pub comparison: Option<&'a str>,
}

pub fn proposal_list(query: &ProposalQuery<'_>) -> ProposalListView {
    let visible = query.proposals.visible_ids(query.time_range, query.search);
    let is_selected = |id: &ProposalId| query.selected.is_some_and(|s| s.contains(id));
    let vote_of = |voter: Option<&str>, id: &ProposalId| {
        voter.and_then(|v| query.votes.and_then(|t| t.vote(v, id)))
    };

    let proposals: Vec<ProposalSummary> = visible
        .iter()
        .rev()
        .filter_map(|id| query.proposals.get(id))
        .map(|p| ProposalSummary {
            id: p.id,
            title: p.title.clone(),
            category: p.category.clone(),
            sub_category: p.sub_category.clone(),
            status: p.status,
            time_voting_start: p.time_voting_start,
            time_voting_end: p.time_voting_end,
            ratios: p.ratios,
            total_votes: p.total_votes,
            selected: is_selected(&p.id),
            reference_vote: vote_of(query.reference, &p.id),
            comparison_vote: vote_of(query.comparison, &p.id),
        })
        .collect();

    ProposalListView {
        time_bounds: query.proposals.time_bounds(),
        time_range: query.time_range.copied(),
        total: query.proposals.len(),
        selected_count: query.selected.map_or(0, BTreeSet::len),
        all_visible_selected: !visible.is_empty() && visible.iter().all(is_selected),
        proposals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govmap_shared::Proposal;

    fn proposal(id: u64, start: u64, title: &str) -> Proposal {
        Proposal {
            id: ProposalId::new(id),
            title: title.to_string(),
            category: "Text".to_string(),
            sub_category: None,
            status: ProposalStatus::Passed,
            time_voting_start: start,
            time_voting_end: start + 10,
            ratios: VoteRatios::default(),
            total_votes: 0,
        }
    }

    #[test]
    fn test_list_is_newest_first_and_filtered() {
        let set = ProposalSet::new([
            proposal(1, 100, "Community pool spend"),
            proposal(2, 200, "Upgrade v9"),
            proposal(10, 300, "Upgrade v10"),
        ]);
        let selected = BTreeSet::from([ProposalId::new(2), ProposalId::new(10)]);
        let view = proposal_list(&ProposalQuery {
            proposals: &set,
            votes: None,
            selected: Some(&selected),
            time_range: Some(&TimeRange::new(150, 400)),
            search: "upgrade",
            reference: None,
            comparison: None,
        });

        let ids: Vec<u64> = view.proposals.iter().map(|p| p.id.number()).collect();
        assert_eq!(ids, vec![10, 2]);
        assert!(view.all_visible_selected);
        assert_eq!(view.total, 3);
        assert_eq!(view.time_bounds, Some(TimeRange::new(100, 300)));
    }

    #[test]
    fn test_empty_visible_set_is_not_all_selected() {
        let set = ProposalSet::new([proposal(1, 100, "a")]);
        let view = proposal_list(&ProposalQuery {
            proposals: &set,
            votes: None,
            selected: None,
            time_range: None,
            search: "nothing matches",
            reference: None,
            comparison: None,
        });
        assert!(view.proposals.is_empty());
        assert!(!view.all_visible_selected);
    }
}

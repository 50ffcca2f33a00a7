use crate::*;
use indexmap::IndexMap;
use uuid::Uuid;

/// One row of an election's results.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CandidateTally {
    pub candidate_id: Uuid,
    pub name: String,
    pub votes: usize,
    pub percentage: f64,
}

impl CandidateTally {
    /// Count votes per candidate.
    ///
    /// Rows are sorted by descending vote count; candidates with equal
    /// counts keep their insertion order within the election (the sort is
    /// stable, the input order is the candidate list's). Candidates without
    /// votes are omitted, so zero votes yields an empty result.
    pub fn count(candidates: &[Candidate], votes: &[Vote]) -> Vec<CandidateTally> {
        let mut counts: IndexMap<Uuid, usize> = IndexMap::new();
        for vote in votes {
            *counts.entry(vote.candidate_id).or_insert(0) += 1;
        }

        let total = votes.len();
        let mut results: Vec<CandidateTally> = candidates
            .iter()
            .filter_map(|candidate| {
                let n = *counts.get(&candidate.id)?;
                Some(CandidateTally {
                    candidate_id: candidate.id,
                    name: candidate.name.clone(),
                    votes: n,
                    percentage: n as f64 * 100.0 / total as f64,
                })
            })
            .collect();

        results.sort_by(|a, b| b.votes.cmp(&a.votes));
        results
    }
}

use crate::*;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// A ballot store.
///
/// The one-vote-per-voter-per-election invariant lives HERE, not in the
/// services above: `insert_vote` must be an atomic compare-and-insert keyed
/// by (voter, election), so that concurrent submissions from the same voter
/// race on the store's own guarantee rather than on an application lock.
/// Backends map this onto their native mechanism (a unique index for SQL,
/// a guarded map for memory).
pub trait Store: Send + Sync {
    fn election(&self, id: Uuid) -> Result<Option<Election>, Error>;

    /// Candidates of an election, in insertion order. The order is the
    /// tally's tie-break and must be stable.
    fn candidates(&self, election_id: Uuid) -> Result<Vec<Candidate>, Error>;

    fn voter(&self, id: Uuid) -> Result<Option<VoterProfile>, Error>;

    fn put_election(&self, election: Election) -> Result<(), Error>;
    fn put_candidate(&self, candidate: Candidate) -> Result<(), Error>;
    fn put_voter(&self, voter: VoterProfile) -> Result<(), Error>;

    /// Insert a vote, or fail with `AlreadyVoted` if a vote for the same
    /// (voter, election) pair exists. On success the returned vote carries
    /// its integrity hash: the store links the chain inside the same
    /// critical section as the insert, so the chain head cannot race.
    fn insert_vote(&self, vote: Vote) -> Result<Vote, Error>;

    /// All votes of an election, in insertion order.
    fn votes(&self, election_id: Uuid) -> Result<Vec<Vote>, Error>;

    fn vote_by_code(&self, code: &VerificationCode) -> Result<Option<Vote>, Error>;

    /// Current head of the election's integrity chain.
    fn chain_head(&self, election_id: Uuid) -> Result<Option<IntegrityHash>, Error>;
}

#[derive(Default)]
struct MemStoreInner {
    elections: BTreeMap<Uuid, Election>,
    // Keyed by election; Vec preserves candidate insertion order.
    candidates: BTreeMap<Uuid, Vec<Candidate>>,
    voters: BTreeMap<Uuid, VoterProfile>,
    // Keyed by (election, voter) - the uniqueness key.
    votes: BTreeMap<(Uuid, Uuid), Vote>,
    // Insertion order per election, for tallies and chain verification.
    vote_log: BTreeMap<Uuid, Vec<Vote>>,
    by_code: BTreeMap<VerificationCode, Vote>,
    chain_heads: BTreeMap<Uuid, IntegrityHash>,
}

/// A simple in-memory store backed by mutex-guarded BTreeMaps.
///
/// Clones share the same underlying maps, so concurrent submissions in
/// tests exercise the same uniqueness guarantee a shared database would.
#[derive(Default, Clone)]
pub struct MemStore {
    inner: Arc<Mutex<MemStoreInner>>,
}

impl Store for MemStore {
    fn election(&self, id: Uuid) -> Result<Option<Election>, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.elections.get(&id).cloned())
    }

    fn candidates(&self, election_id: Uuid) -> Result<Vec<Candidate>, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.candidates.get(&election_id).cloned().unwrap_or_default())
    }

    fn voter(&self, id: Uuid) -> Result<Option<VoterProfile>, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.voters.get(&id).cloned())
    }

    fn put_election(&self, election: Election) -> Result<(), Error> {
        let mut inner = self.inner.lock().unwrap();
        inner.elections.insert(election.id, election);
        Ok(())
    }

    fn put_candidate(&self, candidate: Candidate) -> Result<(), Error> {
        let mut inner = self.inner.lock().unwrap();
        let list = inner.candidates.entry(candidate.election_id).or_default();
        match list.iter_mut().find(|c| c.id == candidate.id) {
            Some(existing) => *existing = candidate,
            None => list.push(candidate),
        }
        Ok(())
    }

    fn put_voter(&self, voter: VoterProfile) -> Result<(), Error> {
        let mut inner = self.inner.lock().unwrap();
        inner.voters.insert(voter.id, voter);
        Ok(())
    }

    fn insert_vote(&self, mut vote: Vote) -> Result<Vote, Error> {
        let mut inner = self.inner.lock().unwrap();

        let key = (vote.election_id, vote.voter_id);
        if inner.votes.contains_key(&key) {
            return Err(Error::AlreadyVoted {
                voter: vote.voter_id,
                election: vote.election_id,
            });
        }

        let hash = chain_hash(inner.chain_heads.get(&vote.election_id), &vote);
        vote.integrity_hash = Some(hash);
        inner.chain_heads.insert(vote.election_id, hash);

        inner.by_code.insert(vote.verification_code, vote.clone());
        inner
            .vote_log
            .entry(vote.election_id)
            .or_default()
            .push(vote.clone());
        inner.votes.insert(key, vote.clone());
        Ok(vote)
    }

    fn votes(&self, election_id: Uuid) -> Result<Vec<Vote>, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.vote_log.get(&election_id).cloned().unwrap_or_default())
    }

    fn vote_by_code(&self, code: &VerificationCode) -> Result<Option<Vote>, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.by_code.get(code).cloned())
    }

    fn chain_head(&self, election_id: Uuid) -> Result<Option<IntegrityHash>, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.chain_heads.get(&election_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_vote_is_compare_and_insert() {
        let store = MemStore::default();
        let voter = Uuid::new_v4();
        let election = Uuid::new_v4();

        let first = Vote::new(voter, election, Uuid::new_v4(), Timestamp::from_secs(1));
        let first = store.insert_vote(first).unwrap();
        assert!(first.integrity_hash.is_some());

        // Same voter, same election, different candidate: refused.
        let second = Vote::new(voter, election, Uuid::new_v4(), Timestamp::from_secs(2));
        match store.insert_vote(second).unwrap_err() {
            Error::AlreadyVoted { voter: v, election: e } => {
                assert_eq!(v, voter);
                assert_eq!(e, election);
            }
            other => panic!("expected AlreadyVoted, got {}", other),
        }

        // The refused insert left no trace.
        assert_eq!(store.votes(election).unwrap().len(), 1);
        assert_eq!(store.chain_head(election).unwrap(), first.integrity_hash);
    }

    #[test]
    fn vote_chain_links() {
        let store = MemStore::default();
        let election = Uuid::new_v4();

        for i in 0..4 {
            let vote = Vote::new(
                Uuid::new_v4(),
                election,
                Uuid::new_v4(),
                Timestamp::from_secs(i),
            );
            store.insert_vote(vote).unwrap();
        }

        let votes = store.votes(election).unwrap();
        assert_eq!(votes.len(), 4);
        verify_chain(&votes).unwrap();
        assert_eq!(
            store.chain_head(election).unwrap(),
            votes.last().unwrap().integrity_hash
        );
    }

    #[test]
    fn candidate_order_is_stable() {
        let store = MemStore::default();
        let election = Uuid::new_v4();

        let names = ["Alice", "Bob", "Carol"];
        for name in &names {
            let candidate = Candidate::new(election, name, "President").unwrap();
            store.put_candidate(candidate).unwrap();
        }

        let listed: Vec<String> = store
            .candidates(election)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(listed, names);
    }
}

use crate::*;
use std::collections::{BTreeMap, BTreeSet};

/// An event appended to the ledger's log - the only externally observable
/// side channel for off-chain listeners.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    ProposalCreated {
        proposal_id: u64,
        title: String,
        end: u64,
    },
    VoteCast {
        proposal_id: u64,
        voter: Address,
        approve: bool,
    },
    VoterAuthorized {
        voter: Address,
    },
}

/// The proposal registry and vote ledger.
///
/// Mutations go through `&mut self`, mirroring a host ledger's global
/// transaction order: no two state transitions ever interleave, so no
/// locking exists or is needed inside the ledger. Callers submitting
/// through an actual chain must still treat a pending transaction as
/// not-yet-authoritative until it is confirmed, and must not assume a
/// relative ordering of two near-simultaneous votes.
pub struct VotingLedger {
    owner: Address,
    next_proposal_id: u64,
    proposals: BTreeMap<u64, Proposal>,
    authorized: BTreeSet<Address>,
    // Per-proposal set of addresses that already voted.
    voted: BTreeMap<u64, BTreeSet<Address>>,
    events: Vec<Event>,
}

impl VotingLedger {
    pub fn new(owner: Address) -> Self {
        VotingLedger {
            owner,
            next_proposal_id: 1,
            proposals: BTreeMap::new(),
            authorized: BTreeSet::new(),
            voted: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Create a proposal open from now until now + duration. Owner only.
    pub fn create_proposal(
        &mut self,
        caller: Address,
        title: &str,
        description: &str,
        duration_hours: u64,
        now: u64,
    ) -> Result<u64, LedgerError> {
        if caller != self.owner {
            return Err(LedgerError::NotOwner);
        }
        if title.trim().is_empty() {
            return Err(LedgerError::EmptyTitle);
        }
        if duration_hours == 0 {
            return Err(LedgerError::ZeroDuration);
        }

        let id = self.next_proposal_id;
        self.next_proposal_id += 1;

        let proposal = Proposal {
            id,
            title: title.to_owned(),
            description: description.to_owned(),
            yes_votes: 0,
            no_votes: 0,
            start: now,
            end: now.saturating_add(duration_hours.saturating_mul(3600)),
        };
        self.events.push(Event::ProposalCreated {
            proposal_id: id,
            title: proposal.title.clone(),
            end: proposal.end,
        });
        self.proposals.insert(id, proposal);
        Ok(id)
    }

    /// Add an address to the allow-list. Owner only; authorizing an
    /// already-authorized address is a no-op, not an error.
    pub fn authorize_voter(&mut self, caller: Address, voter: Address) -> Result<(), LedgerError> {
        if caller != self.owner {
            return Err(LedgerError::NotOwner);
        }
        if self.authorized.insert(voter) {
            self.events.push(Event::VoterAuthorized { voter });
        }
        Ok(())
    }

    /// Record a yes/no vote. Exactly one per authorized address per
    /// proposal, inside the proposal's window.
    pub fn vote(
        &mut self,
        caller: Address,
        proposal_id: u64,
        approve: bool,
        now: u64,
    ) -> Result<(), LedgerError> {
        if !self.authorized.contains(&caller) {
            return Err(LedgerError::NotAuthorized(caller));
        }

        let proposal = self
            .proposals
            .get_mut(&proposal_id)
            .ok_or(LedgerError::ProposalNotFound(proposal_id))?;
        if !proposal.is_open(now) {
            return Err(LedgerError::VotingClosed(proposal_id));
        }

        let voted = self.voted.entry(proposal_id).or_default();
        if !voted.insert(caller) {
            return Err(LedgerError::AlreadyVoted(caller));
        }

        if approve {
            proposal.yes_votes += 1;
        } else {
            proposal.no_votes += 1;
        }
        self.events.push(Event::VoteCast {
            proposal_id,
            voter: caller,
            approve,
        });
        Ok(())
    }

    pub fn proposal(&self, id: u64) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    pub fn is_authorized(&self, address: Address) -> bool {
        self.authorized.contains(&address)
    }

    pub fn has_voted(&self, proposal_id: u64, address: Address) -> bool {
        self.voted
            .get(&proposal_id)
            .map_or(false, |set| set.contains(&address))
    }

    /// The full event log, in emission order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    fn ledger_with_proposal() -> (VotingLedger, u64) {
        let mut ledger = VotingLedger::new(addr(1));
        let id = ledger
            .create_proposal(addr(1), "Fund the library", "Annual budget line", 24, NOW)
            .unwrap();
        (ledger, id)
    }

    #[test]
    fn proposal_lifecycle() {
        let (mut ledger, id) = ledger_with_proposal();
        assert_eq!(id, 1);

        let proposal = ledger.proposal(id).unwrap();
        assert_eq!(proposal.start, NOW);
        assert_eq!(proposal.end, NOW + 24 * 3600);
        assert!(proposal.is_open(NOW));
        assert!(proposal.is_open(NOW + 24 * 3600));
        assert!(!proposal.is_open(NOW + 24 * 3600 + 1));

        // Ids are monotonically increasing.
        let next = ledger
            .create_proposal(addr(1), "Second", "", 1, NOW)
            .unwrap();
        assert_eq!(next, 2);
    }

    #[test]
    fn only_owner_creates_and_authorizes() {
        let (mut ledger, _) = ledger_with_proposal();
        assert_eq!(
            ledger.create_proposal(addr(2), "Rogue", "", 1, NOW),
            Err(LedgerError::NotOwner)
        );
        assert_eq!(
            ledger.authorize_voter(addr(2), addr(3)),
            Err(LedgerError::NotOwner)
        );
    }

    #[test]
    fn create_proposal_validates_input() {
        let mut ledger = VotingLedger::new(addr(1));
        assert_eq!(
            ledger.create_proposal(addr(1), "  ", "", 1, NOW),
            Err(LedgerError::EmptyTitle)
        );
        assert_eq!(
            ledger.create_proposal(addr(1), "No window", "", 0, NOW),
            Err(LedgerError::ZeroDuration)
        );
    }

    #[test]
    fn huge_duration_saturates_instead_of_wrapping() {
        let mut ledger = VotingLedger::new(addr(1));
        let id = ledger
            .create_proposal(addr(1), "Forever", "", u64::MAX, NOW)
            .unwrap();

        // A wrapped window would have ended before it started; a saturated
        // one stays open.
        let proposal = ledger.proposal(id).unwrap();
        assert_eq!(proposal.end, u64::MAX);
        assert!(proposal.is_open(NOW));
        assert!(proposal.is_open(u64::MAX));
    }

    #[test]
    fn authorize_is_idempotent() {
        let (mut ledger, _) = ledger_with_proposal();
        ledger.authorize_voter(addr(1), addr(2)).unwrap();
        // The second call has no additional effect and raises no error.
        ledger.authorize_voter(addr(1), addr(2)).unwrap();
        assert!(ledger.is_authorized(addr(2)));

        let authorized_events = ledger
            .events()
            .iter()
            .filter(|e| matches!(e, Event::VoterAuthorized { .. }))
            .count();
        assert_eq!(authorized_events, 1);
    }

    #[test]
    fn one_vote_per_address() {
        let (mut ledger, id) = ledger_with_proposal();
        ledger.authorize_voter(addr(1), addr(2)).unwrap();

        ledger.vote(addr(2), id, true, NOW + 60).unwrap();
        assert_eq!(
            ledger.vote(addr(2), id, true, NOW + 120),
            Err(LedgerError::AlreadyVoted(addr(2)))
        );

        let proposal = ledger.proposal(id).unwrap();
        assert_eq!(proposal.yes_votes, 1);
        assert_eq!(proposal.no_votes, 0);
        assert!(ledger.has_voted(id, addr(2)));
    }

    #[test]
    fn vote_requires_authorization_and_open_window() {
        let (mut ledger, id) = ledger_with_proposal();

        assert_eq!(
            ledger.vote(addr(9), id, true, NOW),
            Err(LedgerError::NotAuthorized(addr(9)))
        );

        ledger.authorize_voter(addr(1), addr(2)).unwrap();
        assert_eq!(
            ledger.vote(addr(2), id, true, NOW + 25 * 3600),
            Err(LedgerError::VotingClosed(id))
        );
        assert_eq!(
            ledger.vote(addr(2), 999, true, NOW),
            Err(LedgerError::ProposalNotFound(999))
        );
    }

    #[test]
    fn tallies_and_events() {
        let (mut ledger, id) = ledger_with_proposal();
        for byte in 2..=4 {
            ledger.authorize_voter(addr(1), addr(byte)).unwrap();
        }

        ledger.vote(addr(2), id, true, NOW).unwrap();
        ledger.vote(addr(3), id, false, NOW).unwrap();
        ledger.vote(addr(4), id, true, NOW).unwrap();

        let proposal = ledger.proposal(id).unwrap();
        assert_eq!(proposal.yes_votes, 2);
        assert_eq!(proposal.no_votes, 1);

        // The event log records the creation, the authorizations, and each
        // vote, in order.
        let events = ledger.events();
        assert!(matches!(events[0], Event::ProposalCreated { proposal_id, .. } if proposal_id == id));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, Event::VoteCast { .. }))
                .count(),
            3
        );
    }
}

use crate::*;
use uuid::Uuid;

/// The ballot submission service, plus the read endpoints built on the same
/// store.
///
/// Stateless apart from the store handle and the event feed: any number of
/// clones (or service instances over a shared backend) may run concurrently,
/// because double-vote protection lives in the store's atomic insert.
#[derive(Clone)]
pub struct BallotBox<S: Store> {
    store: S,
    feed: VoteFeed,
}

impl<S: Store> BallotBox<S> {
    pub fn new(store: S) -> Self {
        BallotBox {
            store,
            feed: VoteFeed::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Cast a ballot: one durable vote row, one verification code back.
    ///
    /// The duplicate check is NOT read-then-insert; the insert itself fails
    /// atomically on a (voter, election) conflict, so two tabs submitting at
    /// once get exactly one code and one `AlreadyVoted` between them.
    pub fn cast_vote(
        &self,
        voter_id: Uuid,
        election_id: Uuid,
        candidate_id: Uuid,
        now: Timestamp,
    ) -> Result<VerificationCode, Error> {
        let voter = self
            .store
            .voter(voter_id)?
            .ok_or(Error::NotAuthenticated(voter_id))?;

        let election = self
            .store
            .election(election_id)?
            .ok_or(Error::ElectionNotFound(election_id))?;
        if !election.is_open(now) {
            return Err(Error::ElectionNotActive(election_id));
        }

        let candidates = self.store.candidates(election_id)?;
        if !candidates.iter().any(|c| c.id == candidate_id) {
            return Err(Error::InvalidCandidate {
                candidate: candidate_id,
                election: election_id,
            });
        }

        let vote = Vote::new(voter.id, election_id, candidate_id, now);
        let vote = self.store.insert_vote(vote)?;

        self.feed.publish(VoteEvent {
            election_id: vote.election_id,
            candidate_id: vote.candidate_id,
            cast_at: vote.cast_at,
        });

        Ok(vote.verification_code)
    }

    /// Current results for an election. Zero votes is an empty tally, not
    /// an error.
    pub fn tally(&self, election_id: Uuid) -> Result<Vec<CandidateTally>, Error> {
        self.store
            .election(election_id)?
            .ok_or(Error::ElectionNotFound(election_id))?;
        let candidates = self.store.candidates(election_id)?;
        let votes = self.store.votes(election_id)?;
        Ok(CandidateTally::count(&candidates, &votes))
    }

    /// Confirm a vote by verification code. See [`verify_code`].
    pub fn verify(&self, code: &str) -> Result<Option<VerifiedVote>, Error> {
        verify_code(&self.store, code)
    }

    /// Subscribe to live vote events for one election.
    pub fn subscribe(&self, election_id: Uuid) -> VoteSubscription {
        self.feed.subscribe(election_id)
    }

    // Administration
    // --------------

    /// Create a voter profile on first authentication, or return the
    /// existing one. Never touches the admin flag.
    pub fn register_voter(&self, voter_id: Uuid, display_name: &str) -> Result<VoterProfile, Error> {
        if let Some(existing) = self.store.voter(voter_id)? {
            return Ok(existing);
        }
        let profile = VoterProfile::new(voter_id, display_name);
        self.store.put_voter(profile.clone())?;
        Ok(profile)
    }

    /// Record that the voter registered a biometric credential with the
    /// external provider. Only the opaque credential id is kept.
    pub fn register_biometric(
        &self,
        voter_id: Uuid,
        credential_id: &str,
        now: Timestamp,
    ) -> Result<(), Error> {
        let mut voter = self
            .store
            .voter(voter_id)?
            .ok_or(Error::NotAuthenticated(voter_id))?;
        voter.credential = Some(BiometricCredential {
            credential_id: credential_id.to_owned(),
            registered_at: now,
        });
        self.store.put_voter(voter)
    }

    pub fn create_election(
        &self,
        admin_id: Uuid,
        title: &str,
        description: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Election, Error> {
        self.require_admin(admin_id)?;
        let election = Election::new(title, description, start, end, admin_id)?;
        self.store.put_election(election.clone())?;
        Ok(election)
    }

    pub fn add_candidate(
        &self,
        admin_id: Uuid,
        election_id: Uuid,
        name: &str,
        position: &str,
    ) -> Result<Candidate, Error> {
        self.require_admin(admin_id)?;
        self.store
            .election(election_id)?
            .ok_or(Error::ElectionNotFound(election_id))?;
        let candidate = Candidate::new(election_id, name, position)?;
        self.store.put_candidate(candidate.clone())?;
        Ok(candidate)
    }

    /// Toggle whether an election accepts ballots.
    pub fn set_election_active(
        &self,
        admin_id: Uuid,
        election_id: Uuid,
        active: bool,
    ) -> Result<(), Error> {
        self.require_admin(admin_id)?;
        let mut election = self
            .store
            .election(election_id)?
            .ok_or(Error::ElectionNotFound(election_id))?;
        election.active = active;
        self.store.put_election(election)
    }

    /// Grant the admin flag. Only existing admins may do this.
    pub fn grant_admin(&self, admin_id: Uuid, voter_id: Uuid) -> Result<(), Error> {
        self.require_admin(admin_id)?;
        let mut voter = self
            .store
            .voter(voter_id)?
            .ok_or(Error::NotAuthenticated(voter_id))?;
        voter.is_admin = true;
        self.store.put_voter(voter)
    }

    fn require_admin(&self, voter_id: Uuid) -> Result<VoterProfile, Error> {
        let voter = self
            .store
            .voter(voter_id)?
            .ok_or(Error::NotAuthenticated(voter_id))?;
        if !voter.is_admin {
            return Err(Error::NotAuthorized(voter_id));
        }
        Ok(voter)
    }
}

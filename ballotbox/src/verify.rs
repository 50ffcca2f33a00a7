use crate::*;

/// Look up a vote by its verification code.
///
/// Returns `Ok(None)` for unknown or malformed codes: a bad code is a
/// normal, expected outcome and must read as such, not as a fault. The
/// lookup never joins back to the voter profile, so a valid code reveals
/// the recorded choice but not who cast it.
pub fn verify_code<S: Store>(store: &S, code: &str) -> Result<Option<VerifiedVote>, Error> {
    let code: VerificationCode = match code.trim().parse() {
        Ok(code) => code,
        Err(_) => return Ok(None),
    };

    let vote = match store.vote_by_code(&code)? {
        Some(vote) => vote,
        None => return Ok(None),
    };

    let election = match store.election(vote.election_id)? {
        Some(election) => election,
        None => return Ok(None),
    };
    let candidate = match store
        .candidates(vote.election_id)?
        .into_iter()
        .find(|c| c.id == vote.candidate_id)
    {
        Some(candidate) => candidate,
        None => return Ok(None),
    };

    Ok(Some(VerifiedVote {
        election_title: election.title,
        position: candidate.position,
        candidate_name: candidate.name,
        cast_at: vote.cast_at,
    }))
}

use thiserror::Error;
use uuid::Uuid;

/// Operational errors returned to callers as typed outcomes.
///
/// Nothing here is auto-retried: `Unavailable` is the single retryable
/// condition, everything else is terminal and must be handled (or shown to
/// the voter) as-is. `AlreadyVoted` in particular is an expected outcome,
/// not a system fault.
#[derive(Debug, Error)]
pub enum Error {
    #[error("ballotbox: voter {voter} already voted in election {election}")]
    AlreadyVoted { voter: Uuid, election: Uuid },

    #[error("ballotbox: voter {0} is not authenticated")]
    NotAuthenticated(Uuid),

    #[error("ballotbox: voter {0} is not authorized for this operation")]
    NotAuthorized(Uuid),

    #[error("ballotbox: election {0} not found")]
    ElectionNotFound(Uuid),

    #[error("ballotbox: election {0} is not open for voting")]
    ElectionNotActive(Uuid),

    #[error("ballotbox: candidate {candidate} does not belong to election {election}")]
    InvalidCandidate { candidate: Uuid, election: Uuid },

    #[error("ballotbox: {0}")]
    Validation(#[from] ValidationError),

    #[error("ballotbox: storage unavailable: {0}")]
    Unavailable(String),
}

impl Error {
    /// Whether a caller may retry the failed operation (with backoff).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Unavailable(_))
    }
}

/// Input validation errors. Terminal: the caller must correct and resubmit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("validation: title must not be empty")]
    EmptyTitle,

    #[error("validation: election window ends before it starts")]
    WindowEndsBeforeStart,

    #[error("validation: candidate name must not be empty")]
    EmptyCandidateName,

    #[error("validation: position label must not be empty")]
    EmptyPosition,

    #[error("validation: invalid verification code - invalid hexadecimal")]
    CodeBadHex,

    #[error("validation: invalid verification code - wrong length")]
    CodeBadLen,

    #[error("validation: invalid integrity hash - invalid hexadecimal")]
    HashBadHex,

    #[error("validation: invalid integrity hash - wrong length")]
    HashBadLen,
}

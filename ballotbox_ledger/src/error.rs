use crate::Address;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger: only the owner may perform this operation")]
    NotOwner,

    #[error("ledger: address {0} is not an authorized voter")]
    NotAuthorized(Address),

    #[error("ledger: address {0} has already voted on this proposal")]
    AlreadyVoted(Address),

    #[error("ledger: proposal {0} not found")]
    ProposalNotFound(u64),

    #[error("ledger: proposal {0} is not open for voting")]
    VotingClosed(u64),

    #[error("ledger: proposal title must not be empty")]
    EmptyTitle,

    #[error("ledger: proposal duration must be at least one hour")]
    ZeroDuration,

    #[error("ledger: invalid address - invalid hexadecimal")]
    AddressBadHex,

    #[error("ledger: invalid address - wrong length")]
    AddressBadLen,
}

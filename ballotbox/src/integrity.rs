use crate::*;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::convert::TryInto;
use std::str::FromStr;
use thiserror::Error;

/// A link in the per-election integrity chain.
///
/// Each vote's hash commits to the previous chain head and the vote's
/// public fields. The voter id is deliberately excluded so the chain can be
/// published without weakening anonymity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IntegrityHash([u8; 32]);

impl IntegrityHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for IntegrityHash {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| ValidationError::HashBadHex)?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| ValidationError::HashBadLen)?;
        Ok(IntegrityHash(bytes))
    }
}

impl std::fmt::Display for IntegrityHash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Serialize for IntegrityHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for IntegrityHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FromStr::from_str(&s).map_err(de::Error::custom)
    }
}

/// Compute the chain hash for a vote given the election's current chain
/// head (`None` for the first vote of an election).
pub fn chain_hash(prev: Option<&IntegrityHash>, vote: &Vote) -> IntegrityHash {
    let mut hasher = Sha256::new();
    if let Some(prev) = prev {
        hasher.update(prev.as_bytes());
    }
    hasher.update(vote.id.as_bytes());
    hasher.update(vote.election_id.as_bytes());
    hasher.update(vote.candidate_id.as_bytes());
    hasher.update(vote.verification_code.as_bytes());
    hasher.update(&vote.cast_at.as_secs().to_be_bytes());
    IntegrityHash(hasher.finalize().into())
}

/// A break found while re-verifying an election's integrity chain.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainFault {
    #[error("integrity chain: vote at index {0} has no hash")]
    MissingHash(usize),

    #[error("integrity chain: vote at index {0} does not link to its predecessor")]
    BrokenLink(usize),
}

/// Re-verify the chain over an election's votes, in insertion order.
pub fn verify_chain(votes: &[Vote]) -> Result<(), ChainFault> {
    let mut head: Option<IntegrityHash> = None;
    for (i, vote) in votes.iter().enumerate() {
        let stored = vote.integrity_hash.ok_or(ChainFault::MissingHash(i))?;
        let expected = chain_hash(head.as_ref(), vote);
        if stored != expected {
            return Err(ChainFault::BrokenLink(i));
        }
        head = Some(stored);
    }
    Ok(())
}

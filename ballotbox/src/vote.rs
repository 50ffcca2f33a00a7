use crate::*;
use rand::RngCore;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::convert::TryInto;
use std::str::FromStr;
use uuid::Uuid;

/// An anonymous receipt for a recorded vote.
///
/// 128 bits of OS randomness, displayed as hex. The code is the only handle
/// the verification path accepts; it never maps back to a voter identity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VerificationCode([u8; 16]);

impl VerificationCode {
    /// Generate a fresh random code. Collision probability over 128 random
    /// bits is negligible; the unique index on the store is the backstop.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        VerificationCode(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl FromStr for VerificationCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| ValidationError::CodeBadHex)?;
        let bytes: [u8; 16] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| ValidationError::CodeBadLen)?;
        Ok(VerificationCode(bytes))
    }
}

impl std::fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Serialize for VerificationCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for VerificationCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FromStr::from_str(&s).map_err(de::Error::custom)
    }
}

/// A recorded vote. Immutable after insertion: there is no update or delete
/// path, and at most one exists per (voter, election).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Vote {
    pub id: Uuid,
    pub election_id: Uuid,
    pub candidate_id: Uuid,
    pub voter_id: Uuid,
    pub verification_code: VerificationCode,
    pub cast_at: Timestamp,

    /// Link in the per-election integrity chain. `None` until the store
    /// assigns it at insert time (chaining must be atomic with the insert).
    pub integrity_hash: Option<IntegrityHash>,
}

impl Vote {
    pub fn new(voter_id: Uuid, election_id: Uuid, candidate_id: Uuid, cast_at: Timestamp) -> Self {
        Vote {
            id: Uuid::new_v4(),
            election_id,
            candidate_id,
            voter_id,
            verification_code: VerificationCode::generate(),
            cast_at,
            integrity_hash: None,
        }
    }
}

/// What the verifier reveals for a valid code: enough for the code holder to
/// confirm the recorded choice, and nothing that identifies the voter.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct VerifiedVote {
    pub election_title: String,
    pub position: String,
    pub candidate_name: String,
    pub cast_at: Timestamp,
}

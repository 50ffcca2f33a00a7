use crate::*;
use uuid::Uuid;

/// A voter profile, keyed by the authentication provider's identity.
///
/// Created on first authentication. The admin flag is only ever granted by
/// an existing admin.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VoterProfile {
    /// Equal to the auth provider's subject id for this voter.
    pub id: Uuid,
    pub display_name: String,
    pub is_admin: bool,

    /// Set once the voter has registered a biometric credential with the
    /// external provider.
    pub credential: Option<BiometricCredential>,
}

impl VoterProfile {
    pub fn new(id: Uuid, display_name: &str) -> Self {
        VoterProfile {
            id,
            display_name: display_name.to_owned(),
            is_admin: false,
            credential: None,
        }
    }
}

/// An opaque reference to a biometric credential held by an external
/// WebAuthn-style or face-matching provider.
///
/// Raw biometric samples never reach this system; only the provider's
/// credential identifier is stored.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BiometricCredential {
    pub credential_id: String,
    pub registered_at: Timestamp,
}

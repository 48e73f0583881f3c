//! Ceremony data model
//!
//! The structures exchanged between the relying-party client, the codec and
//! the authenticator gateway. Challenge types are owned by one in-flight
//! ceremony and consumed by a single authenticator invocation.

use serde::{Deserialize, Serialize};

/// How much attestation the relying party asked for at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationPreference {
    #[default]
    None,
    Indirect,
    Direct,
}

impl AttestationPreference {
    /// Map a wire literal to a preference. Anything unrecognized falls back
    /// to [`AttestationPreference::None`].
    pub fn from_wire(value: &str) -> Self {
        match value {
            "direct" => Self::Direct,
            "indirect" => Self::Indirect,
            _ => Self::None,
        }
    }
}

/// Decoded register-initiate challenge, ready to hand to the authenticator.
///
/// `rp_id` is supplied from configuration; the legacy wire format only
/// carries the relying party's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeBundle {
    pub challenge: Vec<u8>,
    pub rp_id: String,
    pub rp_name: String,
    pub user_id: String,
    pub user_name: String,
    pub attestation: AttestationPreference,
    /// Passed through verbatim from `authenticatorSelection`; `None` when the
    /// server sent no selection, which is distinct from an empty string.
    pub authenticator_attachment: Option<String>,
}

/// Decoded auth-initiate challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionChallenge {
    pub challenge: Vec<u8>,
    pub rp_id: String,
    /// Credentials the server will accept, in server order. May be empty, in
    /// which case the authenticator is free to pick any resident credential.
    pub allow_credentials: Vec<CredentialDescriptor>,
}

/// Identifies one previously registered credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialDescriptor {
    pub id: Vec<u8>,
}

impl CredentialDescriptor {
    /// The only credential type this protocol knows.
    pub const KIND: &'static str = "public-key";
}

/// Produced by the authenticator on successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationResult {
    pub credential_id: Vec<u8>,
    pub client_data_json: Vec<u8>,
    pub attestation_object: Vec<u8>,
}

/// Produced by the authenticator on successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    pub credential_id: Vec<u8>,
    pub client_data_json: Vec<u8>,
    pub authenticator_data: Vec<u8>,
    pub signature: Vec<u8>,
}

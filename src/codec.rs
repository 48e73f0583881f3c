//! Wire codec for ceremony payloads
//!
//! Bidirectional mapping between the relying party's JSON dialect and the
//! ceremony data model. One quirk of that dialect: the verifier decodes
//! `attestationObject` with the standard padded base64 alphabet while every
//! other byte field travels as unpadded URL-safe base64. Both encoders below
//! honor that split; changing it breaks the deployed server.

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine as _,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::CeremonyError;
use crate::types::{
    AssertionChallenge, AssertionResult, AttestationPreference, AttestationResult,
    ChallengeBundle, CredentialDescriptor,
};

/// Decode a base64url byte field, tolerating trailing `=` padding and
/// falling back to the standard alphabet for servers that emit it.
pub fn decode_bytes(input: &str) -> Result<Vec<u8>, CeremonyError> {
    let unpadded = input.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(unpadded)
        .or_else(|_| STANDARD.decode(input))
        .map_err(CeremonyError::Encoding)
}

/// Encode a byte field the way the wire expects everywhere except
/// `attestationObject`: URL-safe alphabet, no padding.
pub fn encode_bytes(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

// Wire shape of a register/initiate response body.
#[derive(Deserialize)]
struct RegistrationChallengeWire {
    #[serde(rename = "initiateRegistrationResponse")]
    response: RegistrationChallengeInner,
}

#[derive(Deserialize)]
struct RegistrationChallengeInner {
    challenge: String,
    rp: RpEntityWire,
    user: UserEntityWire,
    attestation: Option<String>,
    #[serde(rename = "authenticatorSelection")]
    authenticator_selection: Option<AuthenticatorSelectionWire>,
}

#[derive(Deserialize)]
struct RpEntityWire {
    name: String,
}

#[derive(Deserialize)]
struct UserEntityWire {
    name: String,
    id: String,
}

#[derive(Deserialize)]
struct AuthenticatorSelectionWire {
    #[serde(rename = "authenticatorAttachment")]
    authenticator_attachment: Option<String>,
}

// Wire shape of an auth/initiate response body.
#[derive(Deserialize)]
struct AssertionChallengeWire {
    challenge: String,
    #[serde(rename = "allowCredentials", default)]
    allow_credentials: Vec<AllowCredentialWire>,
}

#[derive(Deserialize)]
struct AllowCredentialWire {
    id: String,
}

/// Lossless translator between wire JSON and ceremony structures.
///
/// Carries the configured relying-party id so decoded challenges arrive at
/// the authenticator fully qualified.
#[derive(Debug, Clone)]
pub struct CeremonyCodec {
    rp_id: String,
}

impl CeremonyCodec {
    pub fn new(rp_id: impl Into<String>) -> Self {
        Self { rp_id: rp_id.into() }
    }

    /// Decode a register/initiate response into authenticator parameters.
    ///
    /// Fails with [`CeremonyError::MalformedChallenge`] when `challenge`,
    /// `rp.name`, `user.name` or `user.id` is missing. An unrecognized or
    /// absent `attestation` literal defaults to `none`; the attachment is
    /// passed through verbatim, with absence kept distinct from `""`.
    pub fn decode_registration_challenge(
        &self,
        body: &str,
    ) -> Result<ChallengeBundle, CeremonyError> {
        let wire: RegistrationChallengeWire = serde_json::from_str(body)
            .map_err(|e| CeremonyError::MalformedChallenge(e.to_string()))?;
        let inner = wire.response;

        let challenge = decode_bytes(&inner.challenge)?;
        let attestation = inner
            .attestation
            .as_deref()
            .map(AttestationPreference::from_wire)
            .unwrap_or_default();
        let authenticator_attachment = inner
            .authenticator_selection
            .and_then(|selection| selection.authenticator_attachment);

        Ok(ChallengeBundle {
            challenge,
            rp_id: self.rp_id.clone(),
            rp_name: inner.rp.name,
            user_id: inner.user.id,
            user_name: inner.user.name,
            attestation,
            authenticator_attachment,
        })
    }

    /// Decode an auth/initiate response.
    ///
    /// `allowCredentials` may be absent or empty; each present entry must
    /// carry a base64url `id`.
    pub fn decode_authentication_challenge(
        &self,
        body: &str,
    ) -> Result<AssertionChallenge, CeremonyError> {
        let wire: AssertionChallengeWire = serde_json::from_str(body)
            .map_err(|e| CeremonyError::MalformedChallenge(e.to_string()))?;

        let challenge = decode_bytes(&wire.challenge)?;
        let allow_credentials = wire
            .allow_credentials
            .into_iter()
            .map(|credential| {
                Ok(CredentialDescriptor {
                    id: decode_bytes(&credential.id)?,
                })
            })
            .collect::<Result<Vec<_>, CeremonyError>>()?;

        Ok(AssertionChallenge {
            challenge,
            rp_id: self.rp_id.clone(),
            allow_credentials,
        })
    }

    /// Encode an attestation result for register/complete.
    pub fn encode_attestation(&self, result: &AttestationResult) -> Value {
        let credential_id = encode_bytes(&result.credential_id);
        json!({
            "type": CredentialDescriptor::KIND,
            "id": credential_id.as_str(),
            "rawId": credential_id.as_str(),
            "getClientExtensionResults": {},
            "response": {
                // standard padded alphabet, see module docs
                "attestationObject": STANDARD.encode(&result.attestation_object),
                "clientDataJSON": encode_bytes(&result.client_data_json),
            },
        })
    }

    /// Encode an assertion result for auth/complete.
    pub fn encode_assertion(&self, result: &AssertionResult) -> Value {
        let credential_id = encode_bytes(&result.credential_id);
        json!({
            "type": CredentialDescriptor::KIND,
            "id": credential_id.as_str(),
            "rawId": credential_id.as_str(),
            "getClientExtensionResults": {},
            "response": {
                "clientDataJSON": encode_bytes(&result.client_data_json),
                "signature": encode_bytes(&result.signature),
                "userHandle": "",
                "authenticatorData": encode_bytes(&result.authenticator_data),
            },
        })
    }
}

//! Ceremony error taxonomy

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that terminate a ceremony attempt.
///
/// User cancellation is deliberately absent: it is a terminal outcome, not a
/// failure, and lives in [`crate::AuthenticatorOutcome`] and
/// [`crate::CeremonyOutcome`] instead.
#[derive(Error, Debug)]
pub enum CeremonyError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("relying party rejected initiate request (HTTP {status}): {body}")]
    RelyingPartyRejected { status: StatusCode, body: String },

    #[error("registration rejected (HTTP {status}): {body}")]
    RegistrationRejected { status: StatusCode, body: String },

    #[error("authentication rejected (HTTP {status}): {body}")]
    AuthenticationRejected { status: StatusCode, body: String },

    #[error("malformed challenge: {0}")]
    MalformedChallenge(String),

    #[error("encoding error: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("authenticator failure {code}: {message}")]
    Authenticator { code: String, message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

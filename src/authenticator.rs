//! Platform-authenticator seam
//!
//! The platform authenticator is host-controlled: the library hands it
//! structured ceremony parameters and gets back a structured result, an
//! error, or a user cancellation. It is modeled as an injected trait so the
//! orchestrator and codec remain fully testable without real hardware.

use async_trait::async_trait;

use crate::error::CeremonyError;
use crate::types::{AssertionChallenge, AssertionResult, AttestationResult, ChallengeBundle};

/// Failure reported by the authenticator itself, e.g. `NOT_ALLOWED_ERR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatorFault {
    pub code: String,
    pub message: String,
}

impl From<AuthenticatorFault> for CeremonyError {
    fn from(fault: AuthenticatorFault) -> Self {
        CeremonyError::Authenticator {
            code: fault.code,
            message: fault.message,
        }
    }
}

/// Terminal result of one authenticator invocation.
#[derive(Debug)]
pub enum AuthenticatorOutcome<T> {
    /// The user completed the prompt and the authenticator produced a result.
    Completed(T),
    /// The user dismissed the prompt. Carries no code or message and is never
    /// reported to the relying party.
    Cancelled,
    /// The authenticator reported an error.
    Failed(AuthenticatorFault),
}

/// Abstraction over the platform authenticator.
///
/// Each invocation completes exactly once, and a ceremony has at most one
/// invocation outstanding. The challenge value is consumed by the call.
#[async_trait]
pub trait AuthenticatorGateway: Send + Sync {
    /// Create a new credential for the relying party described by `request`.
    async fn invoke_registration(
        &self,
        request: ChallengeBundle,
    ) -> AuthenticatorOutcome<AttestationResult>;

    /// Produce an assertion over a previously registered credential.
    async fn invoke_assertion(
        &self,
        request: AssertionChallenge,
    ) -> AuthenticatorOutcome<AssertionResult>;
}

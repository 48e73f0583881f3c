//! Ceremony orchestration state machine
//!
//! Drives one registration or authentication attempt end to end:
//! initiate with the relying party, invoke the authenticator, complete with
//! the relying party. The original client expressed this as a tangle of
//! per-call response handlers; here the three asynchronous operations are
//! awaited in sequence and joined by explicit state transitions.
//!
//! An orchestrator is single-use: one attempt per instance, then
//! [`CeremonyOrchestrator::reset`] (or a fresh instance) to retry. No stage
//! retries on failure; a failed stage never dispatches the next one.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::authenticator::{AuthenticatorGateway, AuthenticatorOutcome};
use crate::client::RelyingPartyClient;
use crate::codec::CeremonyCodec;
use crate::error::CeremonyError;

const REGISTRATION_SUCCESSFUL: &str = "Registration Successful";
const REGISTRATION_FAILED: &str = "Registration Failed";
const AUTHENTICATION_SUCCESSFUL: &str = "Authentication Successful";
const AUTHENTICATION_FAILED: &str = "Authentication Failed";
const OPERATION_CANCELLED: &str = "Operation is cancelled";

/// Progress of a ceremony attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyState {
    Idle,
    Initiating,
    AwaitingAuthenticator,
    Completing,
    Succeeded,
    Failed,
    Cancelled,
}

impl CeremonyState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

/// Terminal outcome of a ceremony attempt.
///
/// `detail` is the human-readable outcome string; `Failed` also carries the
/// originating error for diagnostics.
#[derive(Debug)]
pub enum CeremonyOutcome {
    Succeeded { detail: String },
    Cancelled { detail: String },
    Failed { detail: String, error: CeremonyError },
}

impl CeremonyOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::Succeeded { detail }
            | Self::Cancelled { detail }
            | Self::Failed { detail, .. } => detail,
        }
    }
}

pub struct CeremonyOrchestrator<G> {
    client: RelyingPartyClient,
    codec: CeremonyCodec,
    gateway: G,
    state: CeremonyState,
    ceremony_id: Uuid,
}

impl<G: AuthenticatorGateway> CeremonyOrchestrator<G> {
    pub fn new(client: RelyingPartyClient, codec: CeremonyCodec, gateway: G) -> Self {
        Self {
            client,
            codec,
            gateway,
            state: CeremonyState::Idle,
            ceremony_id: Uuid::new_v4(),
        }
    }

    pub fn state(&self) -> CeremonyState {
        self.state
    }

    /// Correlation id carried by this attempt's log records.
    pub fn ceremony_id(&self) -> Uuid {
        self.ceremony_id
    }

    /// Make a used orchestrator ready for another attempt.
    pub fn reset(&mut self) {
        self.state = CeremonyState::Idle;
        self.ceremony_id = Uuid::new_v4();
    }

    /// Run a registration ceremony for `username`.
    pub async fn register(&mut self, username: &str) -> CeremonyOutcome {
        if let Err(error) = self.start(username, "registration") {
            return self.fail(REGISTRATION_FAILED, error);
        }

        let bundle = match self.client.initiate_registration(username).await {
            Ok(bundle) => bundle,
            Err(error) => return self.fail(REGISTRATION_FAILED, error),
        };

        self.transition(CeremonyState::AwaitingAuthenticator);
        let attestation = match self.gateway.invoke_registration(bundle).await {
            AuthenticatorOutcome::Completed(result) => result,
            AuthenticatorOutcome::Cancelled => return self.cancel(),
            AuthenticatorOutcome::Failed(fault) => {
                return self.fail(REGISTRATION_FAILED, fault.into())
            }
        };

        self.transition(CeremonyState::Completing);
        let payload = self.codec.encode_attestation(&attestation);
        match self.client.complete_registration(username, payload).await {
            Ok(()) => self.succeed(REGISTRATION_SUCCESSFUL),
            Err(error) => self.fail(REGISTRATION_FAILED, error),
        }
    }

    /// Run an authentication ceremony for `username`.
    pub async fn authenticate(&mut self, username: &str) -> CeremonyOutcome {
        if let Err(error) = self.start(username, "authentication") {
            return self.fail(AUTHENTICATION_FAILED, error);
        }

        let challenge = match self.client.initiate_authentication(username).await {
            Ok(challenge) => challenge,
            Err(error) => return self.fail(AUTHENTICATION_FAILED, error),
        };

        self.transition(CeremonyState::AwaitingAuthenticator);
        let assertion = match self.gateway.invoke_assertion(challenge).await {
            AuthenticatorOutcome::Completed(result) => result,
            AuthenticatorOutcome::Cancelled => return self.cancel(),
            AuthenticatorOutcome::Failed(fault) => {
                return self.fail(AUTHENTICATION_FAILED, fault.into())
            }
        };

        self.transition(CeremonyState::Completing);
        let payload = self.codec.encode_assertion(&assertion);
        match self.client.complete_authentication(username, payload).await {
            Ok(()) => self.succeed(AUTHENTICATION_SUCCESSFUL),
            Err(error) => self.fail(AUTHENTICATION_FAILED, error),
        }
    }

    /// Validate caller input and claim the instance for one attempt. Nothing
    /// touches the network until this has passed.
    fn start(&mut self, username: &str, kind: &str) -> Result<(), CeremonyError> {
        if self.state != CeremonyState::Idle {
            return Err(CeremonyError::InvalidInput(format!(
                "ceremony already used (state {:?}); reset or create a new one",
                self.state
            )));
        }
        if username.trim().is_empty() {
            return Err(CeremonyError::InvalidInput(
                "username must not be empty".to_string(),
            ));
        }
        info!(ceremony = %self.ceremony_id, username, kind, "starting ceremony");
        self.transition(CeremonyState::Initiating);
        Ok(())
    }

    fn transition(&mut self, next: CeremonyState) {
        debug!(
            ceremony = %self.ceremony_id,
            from = ?self.state,
            to = ?next,
            "ceremony transition"
        );
        self.state = next;
    }

    fn succeed(&mut self, detail: &str) -> CeremonyOutcome {
        info!(ceremony = %self.ceremony_id, detail, "ceremony succeeded");
        self.transition(CeremonyState::Succeeded);
        CeremonyOutcome::Succeeded {
            detail: detail.to_string(),
        }
    }

    fn cancel(&mut self) -> CeremonyOutcome {
        info!(ceremony = %self.ceremony_id, "ceremony cancelled by user");
        self.transition(CeremonyState::Cancelled);
        CeremonyOutcome::Cancelled {
            detail: OPERATION_CANCELLED.to_string(),
        }
    }

    fn fail(&mut self, detail: &str, error: CeremonyError) -> CeremonyOutcome {
        warn!(ceremony = %self.ceremony_id, %error, "ceremony failed");
        self.transition(CeremonyState::Failed);
        CeremonyOutcome::Failed {
            detail: detail.to_string(),
            error,
        }
    }
}

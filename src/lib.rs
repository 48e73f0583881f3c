//! passkey-ceremony - WebAuthn/FIDO2 ceremony client
//!
//! Registers and authenticates public-key credentials against a relying-party
//! server. The library drives the ceremony state machine (initiate, invoke
//! authenticator, complete); the platform authenticator itself is an injected
//! [`AuthenticatorGateway`] capability, and relying-party-side validation is
//! the server's business.

pub mod authenticator;
pub mod ceremony;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod session;
pub mod types;

pub use authenticator::{AuthenticatorFault, AuthenticatorGateway, AuthenticatorOutcome};
pub use ceremony::{CeremonyOrchestrator, CeremonyOutcome, CeremonyState};
pub use client::RelyingPartyClient;
pub use codec::CeremonyCodec;
pub use config::CeremonyConfig;
pub use error::CeremonyError;
pub use session::SessionStore;
pub use types::{
    AssertionChallenge, AssertionResult, AttestationPreference, AttestationResult,
    ChallengeBundle, CredentialDescriptor,
};

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared state for all ceremonies within one device/app session.
///
/// The session store is the only mutable state ceremonies share; it lives for
/// the whole process and is handed to every relying-party client by handle.
#[derive(Clone)]
pub struct CeremonyContext {
    pub config: Arc<CeremonyConfig>,
    pub session: Arc<RwLock<SessionStore>>,
}

impl CeremonyContext {
    pub fn new(config: CeremonyConfig) -> Self {
        Self {
            config: Arc::new(config),
            session: Arc::new(RwLock::new(SessionStore::new())),
        }
    }

    /// Build an orchestrator for one ceremony attempt, wired to this
    /// context's session state.
    pub fn orchestrator<G: AuthenticatorGateway>(
        &self,
        gateway: G,
    ) -> Result<CeremonyOrchestrator<G>, CeremonyError> {
        let client = RelyingPartyClient::new(&self.config, Arc::clone(&self.session))?;
        let codec = CeremonyCodec::new(&self.config.rp_id);
        Ok(CeremonyOrchestrator::new(client, codec, gateway))
    }
}

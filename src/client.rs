//! Relying-party HTTP exchanges
//!
//! The four ceremony calls: register/initiate, register/complete,
//! auth/initiate, auth/complete. Every response is scanned for `Set-Cookie`
//! headers, which are absorbed into the shared [`SessionStore`]; the two
//! complete calls replay the accumulated set as a single `Cookie` header.
//! No call retries: a failure surfaces to the orchestrator as-is.

use std::sync::Arc;

use reqwest::{
    header::{ACCEPT, CONTENT_TYPE, COOKIE, SET_COOKIE},
    Client, ClientBuilder, StatusCode,
};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::debug;

use crate::codec::CeremonyCodec;
use crate::config::CeremonyConfig;
use crate::error::CeremonyError;
use crate::session::SessionStore;
use crate::types::{AssertionChallenge, ChallengeBundle};

#[derive(Debug)]
pub struct RelyingPartyClient {
    http: Client,
    base_url: String,
    codec: CeremonyCodec,
    user_verification: String,
    session: Arc<RwLock<SessionStore>>,
}

impl RelyingPartyClient {
    pub fn new(
        config: &CeremonyConfig,
        session: Arc<RwLock<SessionStore>>,
    ) -> Result<Self, CeremonyError> {
        // Validate the endpoint up front so a typo fails before any ceremony.
        reqwest::Url::parse(&config.base_url).map_err(|e| {
            CeremonyError::InvalidInput(format!("invalid base URL {:?}: {}", config.base_url, e))
        })?;

        // Cookie handling stays out of reqwest: the session store owns it.
        let http = ClientBuilder::new()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            codec: CeremonyCodec::new(&config.rp_id),
            user_verification: config.user_verification.clone(),
            session,
        })
    }

    /// Fetch a registration challenge for `username`.
    pub async fn initiate_registration(
        &self,
        username: &str,
    ) -> Result<ChallengeBundle, CeremonyError> {
        let body = json!({
            "username": username,
            "authenticatorSelection": { "userVerification": self.user_verification },
        });
        let (status, text) = self.post("register/initiate", body, false).await?;
        if !status.is_success() {
            return Err(CeremonyError::RelyingPartyRejected { status, body: text });
        }
        self.codec.decode_registration_challenge(&text)
    }

    /// Submit an encoded attestation payload for verification.
    pub async fn complete_registration(
        &self,
        username: &str,
        attestation: Value,
    ) -> Result<(), CeremonyError> {
        let (status, text) = self.post("register/complete", attestation, true).await?;
        if !status.is_success() {
            return Err(CeremonyError::RegistrationRejected { status, body: text });
        }
        debug!(username, "registration accepted by relying party");
        Ok(())
    }

    /// Fetch an assertion challenge for `username`.
    pub async fn initiate_authentication(
        &self,
        username: &str,
    ) -> Result<AssertionChallenge, CeremonyError> {
        let body = json!({ "username": username });
        let (status, text) = self.post("auth/initiate", body, false).await?;
        if !status.is_success() {
            return Err(CeremonyError::RelyingPartyRejected { status, body: text });
        }
        self.codec.decode_authentication_challenge(&text)
    }

    /// Submit an encoded assertion payload for verification.
    pub async fn complete_authentication(
        &self,
        username: &str,
        assertion: Value,
    ) -> Result<(), CeremonyError> {
        let (status, text) = self.post("auth/complete", assertion, true).await?;
        if !status.is_success() {
            return Err(CeremonyError::AuthenticationRejected { status, body: text });
        }
        debug!(username, "authentication accepted by relying party");
        Ok(())
    }

    /// One ceremony round-trip. Set-Cookie capture happens before the status
    /// is interpreted: the server may establish session state on a rejection.
    async fn post(
        &self,
        path: &str,
        body: Value,
        attach_session: bool,
    ) -> Result<(StatusCode, String), CeremonyError> {
        let url = format!("{}/{}", self.base_url, path);

        let mut request = self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&body);

        if attach_session {
            let session = self.session.read().await;
            if let Some(cookie) = session.cookie_header() {
                debug!(%url, %cookie, "attaching session cookies");
                request = request.header(COOKIE, cookie);
            }
        }

        debug!(%url, body = %body, "relying party request");
        let response = request.send().await?;
        let status = response.status();

        let issued: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok().map(str::to_string))
            .collect();
        if !issued.is_empty() {
            let mut session = self.session.write().await;
            for token in issued {
                session.absorb(&token);
            }
        }

        let text = response.text().await?;
        debug!(%url, %status, body = %text, "relying party response");
        Ok((status, text))
    }
}

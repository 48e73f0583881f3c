//! Configuration for the ceremony client

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CeremonyConfig {
    /// Relying-party base URL, e.g. `https://auth.example.com`
    pub base_url: String,

    /// Relying-party identifier handed to the authenticator. The legacy wire
    /// format does not carry it, so it has to be configured.
    pub rp_id: String,

    /// `userVerification` value sent on register/initiate
    pub user_verification: String,

    /// Connection establishment timeout
    pub connect_timeout: Duration,

    /// Per-request timeout, covering the full round-trip
    pub request_timeout: Duration,
}

impl Default for CeremonyConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost:8443".to_string(),
            rp_id: "localhost".to_string(),
            user_verification: "required".to_string(),
            connect_timeout: Duration::from_secs(120),
            request_timeout: Duration::from_secs(120),
        }
    }
}

pub struct CeremonyConfigBuilder {
    config: CeremonyConfig,
}

impl CeremonyConfig {
    pub fn builder() -> CeremonyConfigBuilder {
        CeremonyConfigBuilder {
            config: CeremonyConfig::default(),
        }
    }
}

impl CeremonyConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn rp_id(mut self, rp_id: impl Into<String>) -> Self {
        self.config.rp_id = rp_id.into();
        self
    }

    pub fn user_verification(mut self, policy: impl Into<String>) -> Self {
        self.config.user_verification = policy.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn build(self) -> CeremonyConfig {
        self.config
    }
}

impl CeremonyConfig {
    /// Load configuration from environment and files
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let mut config = config::Config::builder();

        // Start with default
        config = config.add_source(config::Config::try_from(&CeremonyConfig::default())?);

        // Layer on .env file
        if let Ok(_) = dotenvy::dotenv() {
            config = config.add_source(config::Environment::with_prefix("PASSKEY"));
        }

        // Layer on config file if exists
        if std::path::Path::new("passkey.toml").exists() {
            config = config.add_source(config::File::with_name("passkey"));
        }

        config.build()?.try_deserialize()
    }
}

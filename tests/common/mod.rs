//! Shared test fixtures: an in-process relying party and scripted
//! authenticator gateways.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use passkey_ceremony::{
    AssertionChallenge, AssertionResult, AttestationResult, AuthenticatorFault,
    AuthenticatorGateway, AuthenticatorOutcome, ChallengeBundle,
};

pub fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// One request as the stub relying party saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub cookie: Option<String>,
    pub body: Value,
}

/// Per-endpoint behavior knobs for the stub.
#[derive(Debug, Clone)]
pub struct RpBehavior {
    pub register_initiate_status: StatusCode,
    pub register_complete_status: StatusCode,
    pub auth_initiate_status: StatusCode,
    pub auth_complete_status: StatusCode,
    /// base64url credential ids returned from auth/initiate
    pub allow_credential_ids: Vec<&'static str>,
    /// Return a body with none of the expected fields from register/initiate
    pub malformed_register_initiate: bool,
}

impl Default for RpBehavior {
    fn default() -> Self {
        Self {
            register_initiate_status: StatusCode::OK,
            register_complete_status: StatusCode::OK,
            auth_initiate_status: StatusCode::OK,
            auth_complete_status: StatusCode::OK,
            allow_credential_ids: vec!["AAEC"],
            malformed_register_initiate: false,
        }
    }
}

#[derive(Clone)]
struct ServerState {
    behavior: Arc<RpBehavior>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// In-process relying party serving the four ceremony endpoints.
pub struct StubRelyingParty {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubRelyingParty {
    pub async fn spawn(behavior: RpBehavior) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = ServerState {
            behavior: Arc::new(behavior),
            requests: Arc::clone(&requests),
        };

        let app = Router::new()
            .route("/register/initiate", post(register_initiate))
            .route("/register/complete", post(register_complete))
            .route("/auth/initiate", post(auth_initiate))
            .route("/auth/complete", post(auth_complete))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub listener addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve stub");
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }
}

async fn record(state: &ServerState, path: &str, headers: &HeaderMap, body: Value) {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state.requests.lock().await.push(RecordedRequest {
        path: path.to_string(),
        cookie,
        body,
    });
}

fn with_cookie(cookie: &'static str, body: impl IntoResponse) -> Response {
    ([(header::SET_COOKIE, cookie)], body).into_response()
}

async fn register_initiate(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, "register/initiate", &headers, body).await;
    if !state.behavior.register_initiate_status.is_success() {
        return (state.behavior.register_initiate_status, "denied").into_response();
    }
    if state.behavior.malformed_register_initiate {
        return Json(json!({ "unexpected": true })).into_response();
    }
    let payload = json!({
        "initiateRegistrationResponse": {
            "challenge": "AAECAwQ",
            "rp": { "name": "Acme" },
            "user": { "name": "bob", "id": "u1" },
            "attestation": "none",
        }
    });
    with_cookie("sid=register-initiate; Path=/; HttpOnly", Json(payload))
}

async fn register_complete(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, "register/complete", &headers, body).await;
    if !state.behavior.register_complete_status.is_success() {
        return (state.behavior.register_complete_status, "attestation rejected").into_response();
    }
    with_cookie("flavor=oatmeal", StatusCode::OK)
}

async fn auth_initiate(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, "auth/initiate", &headers, body).await;
    if !state.behavior.auth_initiate_status.is_success() {
        return (state.behavior.auth_initiate_status, "denied").into_response();
    }
    let allow: Vec<Value> = state
        .behavior
        .allow_credential_ids
        .iter()
        .map(|id| json!({ "id": id }))
        .collect();
    let payload = json!({ "challenge": "BQYH", "allowCredentials": allow });
    with_cookie("sid=auth-initiate; Path=/", Json(payload))
}

async fn auth_complete(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, "auth/complete", &headers, body).await;
    if !state.behavior.auth_complete_status.is_success() {
        return (state.behavior.auth_complete_status, "assertion rejected").into_response();
    }
    StatusCode::OK.into_response()
}

/// What a scripted authenticator should do when invoked.
#[derive(Debug, Clone, Copy)]
pub enum GatewayScript {
    Complete,
    Cancel,
    Fail,
}

/// Authenticator double that records every invocation and follows its script.
pub struct ScriptedGateway {
    script: GatewayScript,
    pub registrations: Arc<Mutex<Vec<ChallengeBundle>>>,
    pub assertions: Arc<Mutex<Vec<AssertionChallenge>>>,
}

impl ScriptedGateway {
    pub fn new(script: GatewayScript) -> Self {
        Self {
            script,
            registrations: Arc::new(Mutex::new(Vec::new())),
            assertions: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

fn scripted_fault() -> AuthenticatorFault {
    AuthenticatorFault {
        code: "NOT_ALLOWED_ERR".to_string(),
        message: "The operation either timed out or was not allowed".to_string(),
    }
}

#[async_trait]
impl AuthenticatorGateway for ScriptedGateway {
    async fn invoke_registration(
        &self,
        request: ChallengeBundle,
    ) -> AuthenticatorOutcome<AttestationResult> {
        self.registrations.lock().await.push(request);
        match self.script {
            GatewayScript::Complete => AuthenticatorOutcome::Completed(sample_attestation()),
            GatewayScript::Cancel => AuthenticatorOutcome::Cancelled,
            GatewayScript::Fail => AuthenticatorOutcome::Failed(scripted_fault()),
        }
    }

    async fn invoke_assertion(
        &self,
        request: AssertionChallenge,
    ) -> AuthenticatorOutcome<AssertionResult> {
        self.assertions.lock().await.push(request);
        match self.script {
            GatewayScript::Complete => AuthenticatorOutcome::Completed(sample_assertion()),
            GatewayScript::Cancel => AuthenticatorOutcome::Cancelled,
            GatewayScript::Fail => AuthenticatorOutcome::Failed(scripted_fault()),
        }
    }
}

pub fn sample_attestation() -> AttestationResult {
    AttestationResult {
        credential_id: vec![0xfa, 0xde, 0x01],
        client_data_json: br#"{"type":"webauthn.create"}"#.to_vec(),
        attestation_object: vec![0xa3, 0x63, 0x66, 0x6d, 0x74],
    }
}

pub fn sample_assertion() -> AssertionResult {
    AssertionResult {
        credential_id: vec![0xfa, 0xde, 0x01],
        client_data_json: br#"{"type":"webauthn.get"}"#.to_vec(),
        authenticator_data: vec![9, 9, 9],
        signature: vec![7, 7],
    }
}

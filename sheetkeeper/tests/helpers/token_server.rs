//! Local OAuth token endpoint and Sheets values endpoint
//!
//! Both record what they receive so tests can inspect the grant requests
//! and the bearer tokens sent by the gateway.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Test-only RSA key pair (PKCS#8 private key, SPKI public key)
pub const TEST_PRIVATE_KEY: &str = include_str!("../fixtures/test_service_account_key.pem");
pub const TEST_PUBLIC_KEY: &str = include_str!("../fixtures/test_service_account_pub.pem");

pub const TEST_CLIENT_EMAIL: &str = "sheetkeeper@test-project.iam.gserviceaccount.com";
pub const TEST_KEY_ID: &str = "test-key-1";

#[derive(Default)]
struct Recorded {
    grants: Vec<HashMap<String, String>>,
    bearers: Vec<String>,
}

/// Running token (and values) endpoint on an ephemeral local port
#[derive(Clone)]
pub struct TokenServer {
    pub base_url: String,
    recorded: Arc<Mutex<Recorded>>,
}

#[derive(Clone)]
struct ServerState {
    recorded: Arc<Mutex<Recorded>>,
    status: StatusCode,
    expires_in: i64,
}

impl TokenServer {
    /// Issues `token-1`, `token-2`, ... each valid for `expires_in` seconds
    pub async fn start(expires_in: i64) -> Self {
        Self::start_with_status(StatusCode::OK, expires_in).await
    }

    /// Token endpoint that answers every grant with `status`
    pub async fn start_with_status(status: StatusCode, expires_in: i64) -> Self {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let state = ServerState {
            recorded: recorded.clone(),
            status,
            expires_in,
        };

        let app = Router::new()
            .route("/token", post(grant))
            .route("/v4/spreadsheets/:document/values/:range", get(values))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            recorded,
        }
    }

    pub fn token_uri(&self) -> String {
        format!("{}/token", self.base_url)
    }

    pub fn sheets_base(&self) -> String {
        format!("{}/v4", self.base_url)
    }

    /// Form bodies of every grant request so far
    pub fn grants(&self) -> Vec<HashMap<String, String>> {
        self.recorded.lock().unwrap().grants.clone()
    }

    /// `Authorization` headers seen by the values endpoint
    pub fn bearers(&self) -> Vec<String> {
        self.recorded.lock().unwrap().bearers.clone()
    }

    /// Service-account key JSON pointing at this server
    pub fn key_json(&self) -> String {
        json!({
            "type": "service_account",
            "project_id": "test-project",
            "private_key_id": TEST_KEY_ID,
            "private_key": TEST_PRIVATE_KEY,
            "client_email": TEST_CLIENT_EMAIL,
            "token_uri": self.token_uri(),
        })
        .to_string()
    }
}

async fn grant(
    State(state): State<ServerState>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let issued = {
        let mut recorded = state.recorded.lock().unwrap();
        recorded.grants.push(form);
        recorded.grants.len()
    };

    if !state.status.is_success() {
        return (state.status, r#"{"error": "invalid_grant"}"#).into_response();
    }

    Json(json!({
        "access_token": format!("token-{}", issued),
        "expires_in": state.expires_in,
        "token_type": "Bearer",
    }))
    .into_response()
}

async fn values(State(state): State<ServerState>, headers: HeaderMap) -> Json<serde_json::Value> {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.recorded.lock().unwrap().bearers.push(bearer);

    Json(json!({"range": "'Links'!A1:B2", "values": [["Title", "URL"]]}))
}

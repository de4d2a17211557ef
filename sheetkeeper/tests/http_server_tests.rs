//! HTTP trigger tests
//!
//! `POST /run` success and failure contract, and `GET /health`.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use sheetkeeper::driver::RunReport;
use sheetkeeper::{build_router, AppState, Runner};
use sheetkeeper_common::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

/// Runner that succeeds, or fails with a fixed message
struct StubRunner {
    failure: Option<String>,
    runs: AtomicUsize,
}

impl StubRunner {
    fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            failure: None,
            runs: AtomicUsize::new(0),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(message.to_string()),
            runs: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Runner for StubRunner {
    async fn run(&self) -> Result<RunReport> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(Error::RunFailed(message.clone())),
            None => Ok(RunReport {
                run_id: Uuid::new_v4(),
                run_timestamp: "2024-03-01T10-20-30.123456".to_string(),
                sheets: Vec::new(),
            }),
        }
    }
}

/// Runner that panics part way through a run
struct PanickingRunner;

#[async_trait]
impl Runner for PanickingRunner {
    async fn run(&self) -> Result<RunReport> {
        panic!("unexpected failure deep in a run");
    }
}

fn post_run() -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/run")
        .body(Body::empty())
        .unwrap()
}

fn get_health() -> Request<Body> {
    Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_run_success_returns_ok() {
    let runner = StubRunner::succeeding();
    let app = build_router(AppState::new(runner.clone()));

    let response = app.oneshot(post_run()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
    assert_eq!(runner.runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_run_failure_returns_500_with_detail() {
    let app = build_router(AppState::new(StubRunner::failing(
        "1 of 2 sheets failed\ndoc / Links: Sheets error: 403 Forbidden",
    )));

    let response = app.oneshot(post_run()).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_text(response).await;
    assert!(body.contains("1 of 2 sheets failed"));
    assert!(body.contains("doc / Links: Sheets error: 403 Forbidden"));
}

#[tokio::test]
async fn test_run_requires_post() {
    let runner = StubRunner::succeeding();
    let app = build_router(AppState::new(runner.clone()));

    let response = app
        .oneshot(Request::builder().uri("/run").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(runner.runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_health_reports_module() {
    let app = build_router(AppState::new(StubRunner::succeeding()));

    let response = app.oneshot(get_health()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "sheetkeeper");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["uptime_seconds"].is_u64());
    assert!(json.get("last_error").is_none());
}

#[tokio::test]
async fn test_health_shows_last_failure() {
    let state = AppState::new(StubRunner::failing("storage unreachable"));
    let app = build_router(state.clone());

    let response = app.clone().oneshot(post_run()).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = app.oneshot(get_health()).await.unwrap();
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["last_error"], "Run failed: storage unreachable");
    assert_eq!(
        state.last_error.read().await.as_deref(),
        Some("Run failed: storage unreachable")
    );
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = build_router(AppState::new(StubRunner::succeeding()));

    let response = app
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_panicking_run_returns_500_and_records_error() {
    let state = AppState::new(Arc::new(PanickingRunner));
    let app = build_router(state.clone());

    let response = app.clone().oneshot(post_run()).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_text(response).await;
    assert!(
        body.contains("unexpected failure deep in a run"),
        "body was {:?}",
        body
    );

    let last_error = state.last_error.read().await.clone().unwrap();
    assert!(last_error.contains("Run panicked: unexpected failure deep in a run"));

    // Service keeps answering after the panic
    let response = app.oneshot(get_health()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

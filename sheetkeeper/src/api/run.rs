//! Run trigger endpoint

use axum::{extract::State, routing::post, Router};
use sheetkeeper_common::Error;
use tracing::{error, info};

use crate::error::panic_message;
use crate::{ApiError, ApiResult, AppState};

/// POST /run
///
/// Performs one complete run. `200 OK` with body `OK` when every sheet
/// succeeded, otherwise `500` with the failure detail as the body.
///
/// The run executes on its own task so a panic inside it is reported (and
/// recorded as the last error) like any other failure.
pub async fn trigger_run(State(state): State<AppState>) -> ApiResult<&'static str> {
    let runner = state.runner.clone();
    let result = match tokio::spawn(async move { runner.run().await }).await {
        Ok(result) => result,
        Err(join_error) if join_error.is_panic() => Err(Error::Internal(format!(
            "Run panicked: {}",
            panic_message(&*join_error.into_panic())
        ))),
        Err(join_error) => Err(Error::Internal(format!("Run aborted: {}", join_error))),
    };

    match result {
        Ok(report) => {
            info!(run_id = %report.run_id, sheets = report.sheets.len(), "Run succeeded");
            Ok("OK")
        }
        Err(e) => {
            error!(error = %e, "Run failed");
            *state.last_error.write().await = Some(e.to_string());
            Err(ApiError::from(e))
        }
    }
}

pub fn run_routes() -> Router<AppState> {
    Router::new().route("/run", post(trigger_run))
}

//! sheetkeeper library interface
//!
//! Fills in blank metadata columns (title, duration, upload date) next to
//! URL columns in spreadsheets. Every sheet is snapshotted to object storage
//! before it is touched.

pub mod api;
pub mod driver;
pub mod error;
pub mod gateway;
pub mod jobs;
pub mod layout;
pub mod reconciler;
pub mod runner;
pub mod snapshot;
pub mod sources;
pub mod types;

pub use crate::error::{ApiError, ApiResult};
pub use crate::runner::{ConfiguredRunner, Runner};

use axum::Router;
use chrono::{DateTime, Utc};
use sheetkeeper_common::time;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Performs runs on `POST /run`
    pub runner: Arc<dyn Runner>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Detail of the most recent failed run
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(runner: Arc<dyn Runner>) -> Self {
        Self {
            runner,
            startup_time: time::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
///
/// A panicking handler still answers `500` with the panic message as body.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::run_routes())
        .merge(api::health_routes())
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

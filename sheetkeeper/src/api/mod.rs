//! HTTP trigger
//!
//! - `POST /run` performs one run
//! - `GET /health` reports liveness and the last failure

pub mod health;
pub mod run;

pub use health::health_routes;
pub use run::run_routes;

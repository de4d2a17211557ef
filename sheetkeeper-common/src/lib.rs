//! # SheetKeeper Common Library
//!
//! Shared code for the SheetKeeper workspace:
//! - Error types
//! - Configuration loading (TOML + environment overrides)
//! - Duration formatting for spreadsheet cells
//! - Run timestamp utilities

pub mod config;
pub mod error;
pub mod human_time;
pub mod time;

pub use error::{Error, Result};

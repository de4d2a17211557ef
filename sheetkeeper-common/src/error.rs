//! Common error types for SheetKeeper

use thiserror::Error;

/// Common result type for SheetKeeper operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the SheetKeeper crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error (deployment misconfiguration)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Spreadsheet read or write failed
    #[error("Sheets error: {0}")]
    Sheets(String),

    /// Snapshot upload failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// One or more sheets failed during a run
    #[error("Run failed: {0}")]
    RunFailed(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

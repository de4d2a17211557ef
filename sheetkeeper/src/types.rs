//! Core Types and Trait Definitions
//!
//! Defines the metadata model and the capability shared by both metadata
//! sources:
//! - **Rich media** (`sources::rich_media`): title, duration, upload date
//! - **Page title** (`sources::page_title`): document title only
//!
//! The reconciler holds one of each and picks between them by fixed
//! precedence; neither source knows about the other.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Metadata
// ============================================================================

/// Metadata returned by a source lookup.
///
/// Every field is independently optional. A returned record says nothing
/// about which fields are populated; page-title lookups fill `title` only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Source kind reported by the extractor (e.g. "youtube")
    pub extractor: Option<String>,
    /// Item id within the source
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Upload date in source form, `YYYYMMDD`
    pub upload_date: Option<String>,
    pub uploader: Option<String>,
    /// Duration in whole seconds
    pub duration: Option<i64>,
}

impl VideoMetadata {
    /// Record carrying only a title
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

// ============================================================================
// Source trait
// ============================================================================

/// A metadata source queried by URL.
///
/// Implementations normalize their own internal failures (unparseable
/// documents, extractor errors) to `Ok(None)`. Only network-level failures
/// surface as errors, so the caller can abandon the row and move on.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Source name for logging
    fn name(&self) -> &'static str;

    /// Look up metadata for an absolute http(s) URL
    async fn lookup(&self, url: &str) -> Result<Option<VideoMetadata>, SourceError>;
}

/// Metadata source error
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network-level failure while fetching
    #[error("Connectivity error: {0}")]
    Connectivity(String),
}

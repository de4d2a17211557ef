//! Rich Media Source
//!
//! Runs the `yt-dlp` command-line tool in metadata-only mode and maps its
//! JSON dump to `VideoMetadata`.
//!
//! # Behavior
//! - No media is downloaded and playlists are not expanded
//! - Extraction failures (unsupported URL, private video, tool missing, bad
//!   JSON) yield `Ok(None)`
//! - Network failures reported by the tool yield `SourceError::Connectivity`
//! - Results from the catch-all `generic` extractor (unreliable) and from
//!   search-result pages (uninteresting) are discarded
//! - Partial results are normal: any of the seven fields may be absent
//!
//! # Requirements
//! - `yt-dlp` on `PATH` (or configured via `rich_media.command`)

use crate::types::{MetadataSource, SourceError, VideoMetadata};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Extractor outcomes that are never reported
const EXCLUDED_EXTRACTORS: &[&str] = &[
    "generic",            // unreliable
    "youtube:search_url", // uninteresting
];

/// Fragments of tool error output that indicate a network-level failure
const CONNECTIVITY_MARKERS: &[&str] = &[
    "urlopen error",
    "Connection refused",
    "Connection reset",
    "Connection aborted",
    "timed out",
    "Temporary failure in name resolution",
    "Name or service not known",
    "Network is unreachable",
    "getaddrinfo failed",
];

/// Rich media metadata source backed by `yt-dlp`
pub struct RichMediaSource {
    command: String,
}

impl RichMediaSource {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Map the tool's JSON dump to metadata.
    ///
    /// Returns `None` for unparseable output and excluded extractors.
    pub fn parse_dump(json: &str) -> Option<VideoMetadata> {
        let dump: ToolDump = match serde_json::from_str(json) {
            Ok(dump) => dump,
            Err(e) => {
                debug!(error = %e, "Unparseable metadata dump");
                return None;
            }
        };

        if let Some(extractor) = dump.extractor.as_deref() {
            if EXCLUDED_EXTRACTORS.contains(&extractor) {
                debug!(extractor = extractor, "Ignoring excluded extractor result");
                return None;
            }
        }

        Some(VideoMetadata {
            extractor: dump.extractor,
            id: dump.id.as_ref().and_then(value_to_string),
            title: dump.title,
            description: dump.description,
            upload_date: dump.upload_date,
            uploader: dump.uploader,
            duration: dump.duration.as_ref().and_then(value_to_seconds),
        })
    }

    fn is_connectivity_failure(stderr: &str) -> bool {
        CONNECTIVITY_MARKERS.iter().any(|m| stderr.contains(m))
    }
}

#[async_trait]
impl MetadataSource for RichMediaSource {
    fn name(&self) -> &'static str {
        "rich-media"
    }

    async fn lookup(&self, url: &str) -> Result<Option<VideoMetadata>, SourceError> {
        debug!(url = %url, command = %self.command, "Extracting rich media metadata");

        let output = Command::new(&self.command)
            .args([
                "--dump-single-json",
                "--skip-download",
                "--flat-playlist",
                "--no-warnings",
                "--",
                url,
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(command = %self.command, "Rich media tool not installed; skipping extraction");
                return Ok(None);
            }
            Err(e) => {
                warn!(command = %self.command, error = %e, "Failed to run rich media tool");
                return Ok(None);
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if Self::is_connectivity_failure(&stderr) {
                return Err(SourceError::Connectivity(format!(
                    "Extraction of {} failed: {}",
                    url,
                    stderr.trim()
                )));
            }
            debug!(url = %url, stderr = %stderr.trim(), "Extraction found no metadata");
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let metadata = Self::parse_dump(&stdout);

        debug!(
            url = %url,
            extractor = ?metadata.as_ref().and_then(|m| m.extractor.as_deref()),
            title = ?metadata.as_ref().and_then(|m| m.title.as_deref()),
            "Rich media extraction complete"
        );

        Ok(metadata)
    }
}

/// Subset of the tool's JSON dump
#[derive(Debug, Deserialize)]
struct ToolDump {
    extractor: Option<String>,
    id: Option<Value>,
    title: Option<String>,
    description: Option<String>,
    upload_date: Option<String>,
    uploader: Option<String>,
    duration: Option<Value>,
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Whole seconds from an integer, float or numeric string
fn value_to_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.trunc() as i64),
        _ => None,
    }
}

//! Snapshot Writer
//!
//! Before a sheet is reconciled its raw cell matrix is written to object
//! storage as gzip-compressed JSON (array of arrays), under
//! `{prefix}{run-timestamp}-{document-id}-{sheet}.json.gz`.
//!
//! Keys are unique per (run, document, sheet). `/` and `\` in ids and
//! sheet names are replaced with `_` so each snapshot is a single flat key.
//!
//! Snapshots are write-once audit copies. Nothing in this crate reads them
//! back; recovery is an operator task.

pub mod s3;

pub use s3::S3ObjectStore;

use crate::gateway::CellMatrix;
use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use sheetkeeper_common::{Error, Result};
use std::io::Write;
use std::sync::Arc;
use tracing::info;

/// Object storage backend
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `body` under `key`, replacing nothing (keys are run-unique)
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<()>;
}

/// Writes per-sheet snapshots for one run
pub struct SnapshotWriter {
    store: Arc<dyn ObjectStore>,
    run_timestamp: String,
    prefix: String,
}

impl SnapshotWriter {
    pub fn new(store: Arc<dyn ObjectStore>, run_timestamp: impl Into<String>) -> Self {
        Self {
            store,
            run_timestamp: run_timestamp.into(),
            prefix: String::new(),
        }
    }

    /// Prefix prepended to every key (e.g. `sheets/`)
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Storage key for a document's sheet in this run
    pub fn key_for(&self, document_id: &str, sheet: &str) -> String {
        format!(
            "{}{}-{}-{}.json.gz",
            self.prefix,
            self.run_timestamp,
            key_component(document_id),
            key_component(sheet)
        )
    }

    /// Serialize, compress and store a sheet's rows. Returns the key.
    pub async fn snapshot(
        &self,
        document_id: &str,
        sheet_label: &str,
        rows: &CellMatrix,
    ) -> Result<String> {
        let key = self.key_for(document_id, sheet_label);
        let body = encode_snapshot(rows)?;

        info!(
            document_id = %document_id,
            sheet = %sheet_label,
            key = %key,
            rows = rows.len(),
            bytes = body.len(),
            "Writing snapshot"
        );

        self.store.put_object(&key, body).await?;
        Ok(key)
    }
}

fn key_component(value: &str) -> String {
    value.replace(&['/', '\\'][..], "_")
}

/// Compact JSON, gzip-compressed
pub fn encode_snapshot(rows: &CellMatrix) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(rows)?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    encoder
        .finish()
        .map_err(|e| Error::Internal(format!("Snapshot compression failed: {}", e)))
}

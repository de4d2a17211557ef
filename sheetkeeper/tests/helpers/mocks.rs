//! In-memory gateway, scripted metadata sources and object store

use async_trait::async_trait;
use flate2::read::GzDecoder;
use sheetkeeper::gateway::{CellMatrix, SheetGateway};
use sheetkeeper::snapshot::ObjectStore;
use sheetkeeper::types::{MetadataSource, SourceError, VideoMetadata};
use sheetkeeper_common::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::sync::Mutex;

/// Gateway serving fixed ranges and recording every write
#[derive(Default)]
pub struct MemoryGateway {
    ranges: HashMap<(String, String), CellMatrix>,
    failing_writes: HashSet<String>,
    reads: Mutex<Vec<String>>,
    writes: Mutex<Vec<(String, String, String)>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `rows` for `range` (e.g. `'Links'!A:B`) of `document_id`
    pub fn with_range(mut self, document_id: &str, range: &str, rows: CellMatrix) -> Self {
        self.ranges
            .insert((document_id.to_string(), range.to_string()), rows);
        self
    }

    /// Make writes to `address` fail
    pub fn failing_write(mut self, address: &str) -> Self {
        self.failing_writes.insert(address.to_string());
        self
    }

    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }

    /// (document id, address, value) in write order
    pub fn writes(&self) -> Vec<(String, String, String)> {
        self.writes.lock().unwrap().clone()
    }

    /// (address, value) pairs in write order
    pub fn written_cells(&self) -> Vec<(String, String)> {
        self.writes()
            .into_iter()
            .map(|(_, address, value)| (address, value))
            .collect()
    }
}

#[async_trait]
impl SheetGateway for MemoryGateway {
    async fn read_range(&self, document_id: &str, range: &str) -> Result<CellMatrix> {
        self.reads.lock().unwrap().push(range.to_string());
        self.ranges
            .get(&(document_id.to_string(), range.to_string()))
            .cloned()
            .ok_or_else(|| Error::Sheets(format!("Unable to parse range: {}", range)))
    }

    async fn write_cell(&self, document_id: &str, address: &str, value: &str) -> Result<()> {
        if self.failing_writes.contains(address) {
            return Err(Error::Sheets(format!("Write {} rejected", address)));
        }
        self.writes.lock().unwrap().push((
            document_id.to_string(),
            address.to_string(),
            value.to_string(),
        ));
        Ok(())
    }
}

/// Scripted response of a metadata source for one URL
#[derive(Debug, Clone)]
pub enum Scripted {
    Found(VideoMetadata),
    Nothing,
    Offline,
}

/// Metadata source answering from a script and counting calls
pub struct ScriptedSource {
    name: &'static str,
    responses: HashMap<String, Scripted>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            responses: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, url: &str, response: Scripted) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    pub fn with_title(self, url: &str, title: &str) -> Self {
        self.with(url, Scripted::Found(VideoMetadata::with_title(title)))
    }

    /// URLs looked up so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MetadataSource for ScriptedSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn lookup(&self, url: &str) -> std::result::Result<Option<VideoMetadata>, SourceError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.responses.get(url).cloned().unwrap_or(Scripted::Nothing) {
            Scripted::Found(metadata) => Ok(Some(metadata)),
            Scripted::Nothing => Ok(None),
            Scripted::Offline => Err(SourceError::Connectivity(format!(
                "Connection refused: {}",
                url
            ))),
        }
    }
}

/// Object store keeping uploads in memory
#[derive(Default)]
pub struct MemoryStore {
    fail: bool,
    objects: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose uploads always fail
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, body)| body.clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<()> {
        if self.fail {
            return Err(Error::Storage(format!("Upload of {} failed: AccessDenied", key)));
        }
        self.objects.lock().unwrap().push((key.to_string(), body));
        Ok(())
    }
}

/// Decompress and parse a stored snapshot
pub fn decode_snapshot(body: &[u8]) -> CellMatrix {
    let mut json = String::new();
    GzDecoder::new(body).read_to_string(&mut json).unwrap();
    serde_json::from_str(&json).unwrap()
}

//! Durable key-value storage for the consent record.
//!
//! The record is stored as a single JSON blob `{ "consent": { ... } }` under a
//! fixed store name, mirroring what the browser keeps in local storage.

use super::record::ConsentRecord;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Persisted blob layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredConsent {
    pub consent: ConsentRecord,
}

/// Durable storage for the consent record.
pub trait ConsentStore: Send {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<ConsentRecord>>;
    fn save(&mut self, record: &ConsentRecord) -> Result<()>;
}

fn decode_blob(data: &str) -> Result<ConsentRecord> {
    let stored: StoredConsent = serde_json::from_str(data).context("decoding consent blob")?;
    Ok(stored.consent)
}

fn encode_blob(record: &ConsentRecord) -> Result<String> {
    serde_json::to_string(&StoredConsent {
        consent: record.clone(),
    })
    .context("encoding consent blob")
}

/// Store backed by one JSON file.
#[derive(Debug, Clone)]
pub struct FileConsentStore {
    path: PathBuf,
}

impl FileConsentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConsentStore for FileConsentStore {
    fn load(&self) -> Result<Option<ConsentRecord>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("reading consent store {}", self.path.display()));
            }
        };
        decode_blob(&data).map(Some)
    }

    fn save(&mut self, record: &ConsentRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating store directory {}", parent.display()))?;
        }
        let contents = encode_blob(record)?;
        fs::write(&self.path, contents)
            .with_context(|| format!("writing consent store {}", self.path.display()))
    }
}

/// In-process store; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryConsentStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryConsentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a raw blob, as found in an existing profile.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl ConsentStore for MemoryConsentStore {
    fn load(&self) -> Result<Option<ConsentRecord>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| anyhow!("consent store lock poisoned"))?;
        slot.as_deref().map(decode_blob).transpose()
    }

    fn save(&mut self, record: &ConsentRecord) -> Result<()> {
        let contents = encode_blob(record)?;
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow!("consent store lock poisoned"))?;
        *slot = Some(contents);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn decided() -> ConsentRecord {
        ConsentRecord {
            accepted: true,
            analytics: false,
            preferences: true,
            timestamp: Some(Utc::now()),
        }
    }

    #[test]
    fn file_store_reports_absent_record() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileConsentStore::new(dir.path().join("consent.json"));
        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn file_store_keeps_blob_shape() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("consent.json");
        let mut store = FileConsentStore::new(&path);
        let record = decided();

        store.save(&record).expect("save");

        let raw = fs::read_to_string(&path).expect("blob on disk");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json blob");
        assert_eq!(value["consent"]["preferences"], serde_json::Value::Bool(true));
        assert_eq!(store.load().expect("load"), Some(record));
    }

    #[test]
    fn malformed_blob_is_an_error() {
        let store = MemoryConsentStore::with_raw("{\"consent\": 12");
        assert!(store.load().is_err());
    }

    #[test]
    fn memory_store_clones_share_state() {
        let store = MemoryConsentStore::new();
        let mut writer = store.clone();
        writer.save(&decided()).expect("save");
        assert!(store.raw().expect("stored").contains("\"consent\""));
    }
}

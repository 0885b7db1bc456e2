//! Path-keyed registry of ingested documents
//!
//! The registry remembers which files have been ingested so a directory
//! re-scan skips them. It is written to `registry.json` beside the vector
//! index after every change; a failed write is logged and otherwise ignored.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::types::DocumentRecord;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegistryEntry {
    path: PathBuf,
    record: DocumentRecord,
}

/// Insertion-ordered map from canonical file path to document record
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    entries: RwLock<Vec<RegistryEntry>>,
    storage_path: Option<PathBuf>,
    /// Serializes snapshot writes so an older snapshot never lands last
    persist_lock: Mutex<()>,
}

impl DocumentRegistry {
    /// Create an empty, unpersisted registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the registry stored at `path`, starting empty if it is missing or unreadable
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Vec<RegistryEntry>>(&content) {
                Ok(entries) => {
                    tracing::info!("Loaded {} registered documents from {}", entries.len(), path.display());
                    entries
                }
                Err(e) => {
                    tracing::error!("Ignoring corrupt registry at {}: {}", path.display(), e);
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::error!("Could not read registry at {}: {}", path.display(), e);
                Vec::new()
            }
        };

        Self {
            entries: RwLock::new(entries),
            storage_path: Some(path),
            persist_lock: Mutex::new(()),
        }
    }

    /// Whether `path` has been ingested
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.read().iter().any(|e| e.path == path)
    }

    /// Record for `path`, if any
    pub fn get(&self, path: &Path) -> Option<DocumentRecord> {
        self.entries
            .read()
            .iter()
            .find(|e| e.path == path)
            .map(|e| e.record.clone())
    }

    /// Most recently registered record with this file name
    pub fn find_by_filename(&self, filename: &str) -> Option<DocumentRecord> {
        self.entries
            .read()
            .iter()
            .rev()
            .find(|e| e.record.filename == filename)
            .map(|e| e.record.clone())
    }

    /// Add or replace the record for `path`; a replaced entry keeps its position
    pub async fn register(&self, path: impl Into<PathBuf>, record: DocumentRecord) {
        let path = path.into();
        {
            let mut entries = self.entries.write();
            match entries.iter_mut().find(|e| e.path == path) {
                Some(entry) => entry.record = record,
                None => entries.push(RegistryEntry { path, record }),
            }
        }
        self.persist().await;
    }

    /// All records in registration order
    pub fn list(&self) -> Vec<DocumentRecord> {
        self.entries.read().iter().map(|e| e.record.clone()).collect()
    }

    /// Number of registered documents
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    async fn persist(&self) {
        let Some(path) = self.storage_path.clone() else {
            return;
        };

        let _guard = self.persist_lock.lock().await;
        let snapshot = self.entries.read().clone();
        let target = path.clone();
        let result = tokio::task::spawn_blocking(move || write_snapshot(&target, &snapshot))
            .await
            .unwrap_or_else(|e| Err(std::io::Error::other(e.to_string())));

        if let Err(e) = result {
            tracing::warn!("Failed to persist registry to {}: {}", path.display(), e);
        }
    }
}

fn write_snapshot(path: &Path, entries: &[RegistryEntry]) -> std::io::Result<()> {
    let bytes = serde_json::to_vec_pretty(entries)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}

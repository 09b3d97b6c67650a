//! JSON-file state store
//!
//! Persists all keys in a single JSON document with a `savedAt` envelope.
//! Writes go to a sibling temp file first and are renamed into place, so a
//! crash mid-write never leaves a truncated store behind.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{StateStore, StoreError, StoreResult};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreDocument {
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    entries: BTreeMap<String, serde_json::Value>,
}

/// Durable state store backed by a single JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> StoreResult<StoreDocument> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::serialization(self.path.display().to_string(), e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreDocument::default()),
            Err(e) => Err(StoreError::io(self.path.display().to_string(), e)),
        }
    }

    async fn write_document(&self, mut document: StoreDocument) -> StoreResult<()> {
        document.saved_at = Some(Utc::now());
        let bytes = serde_json::to_vec_pretty(&document)
            .map_err(|e| StoreError::serialization(self.path.display().to_string(), e))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::io(parent.display().to_string(), e))?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StoreError::io(tmp.display().to_string(), e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::io(self.path.display().to_string(), e))?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn get(&self, key: &str) -> StoreResult<Option<serde_json::Value>> {
        let document = self.read_document().await?;
        Ok(document.entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        document.entries.insert(key.to_string(), value);
        self.write_document(document).await
    }
}

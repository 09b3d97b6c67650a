//! State store abstraction and implementations
//!
//! Small keyed JSON blobs, no transactions, no cross-key ordering
//! guarantees. Callers must not assume atomic multi-key writes.

pub mod file;
pub mod memory;
pub mod rotation;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use rotation::RotationStateStore;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors reported by a state store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying I/O failure
    #[error("store I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A stored value could not be (de)serialized
    #[error("store serialization error for key '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Generic store error
    #[error("store error: {0}")]
    Other(String),
}

impl StoreError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn serialization(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            key: key.into(),
            source,
        }
    }
}

/// Durable keyed storage of small JSON values.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> StoreResult<Option<serde_json::Value>>;

    /// Write `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: serde_json::Value) -> StoreResult<()>;
}

/// Read and deserialize the value stored under `key`.
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn StateStore,
    key: &str,
) -> StoreResult<Option<T>> {
    match store.get(key).await? {
        Some(value) => {
            let typed =
                serde_json::from_value(value).map_err(|e| StoreError::serialization(key, e))?;
            Ok(Some(typed))
        }
        None => Ok(None),
    }
}

/// Serialize and write `value` under `key`.
pub async fn set_typed<T: Serialize>(
    store: &dyn StateStore,
    key: &str,
    value: &T,
) -> StoreResult<()> {
    let json = serde_json::to_value(value).map_err(|e| StoreError::serialization(key, e))?;
    store.set(key, json).await
}

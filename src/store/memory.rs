//! In-memory state store for tests and embedded use

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{StateStore, StoreResult};

/// Volatile state store backed by a hash map.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<serde_json::Value>> {
        Ok(self.entries.lock().expect("store lock").get(key).cloned())
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> StoreResult<()> {
        self.entries
            .lock()
            .expect("store lock")
            .insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{get_typed, set_typed};

    #[tokio::test]
    async fn test_get_set_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing").await.unwrap(), None);

        store
            .set("flag", serde_json::Value::Bool(true))
            .await
            .unwrap();
        assert_eq!(
            store.get("flag").await.unwrap(),
            Some(serde_json::Value::Bool(true))
        );
    }

    #[tokio::test]
    async fn test_typed_helpers() {
        let store = MemoryStore::new();
        set_typed(&store, "nums", &vec![1u32, 2, 3]).await.unwrap();

        let back: Option<Vec<u32>> = get_typed(&store, "nums").await.unwrap();
        assert_eq!(back, Some(vec![1, 2, 3]));

        // Type mismatch surfaces as a serialization error.
        let bad: super::StoreResult<Option<String>> = get_typed(&store, "nums").await;
        assert!(bad.is_err());
    }
}

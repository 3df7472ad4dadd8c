//! In-memory implementation of the CacheStore trait. Storages are plain
//! nested maps; entries are stored as serialized bytes so the backend
//! round-trips exactly what a durable backend would.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::{CacheError, CacheStore, StoredResponse};

pub struct InMemoryCacheStore {
    storages: Mutex<HashMap<String, HashMap<String, Vec<u8>>>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self {
            storages: Mutex::new(HashMap::new()),
        }
    }

    fn serialize(response: &StoredResponse) -> Result<Vec<u8>, CacheError> {
        serde_json::to_vec(response)
            .map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn deserialize(bytes: &[u8]) -> Result<StoredResponse, CacheError> {
        serde_json::from_slice(bytes)
            .map_err(|e| CacheError::Deserialization(e.to_string()))
    }
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(
        &self,
        storage: &str,
        key: &str,
    ) -> Result<Option<StoredResponse>, CacheError> {
        let storages = self
            .storages
            .lock()
            .map_err(|e| CacheError::Storage(e.to_string()))?;
        match storages.get(storage).and_then(|entries| entries.get(key)) {
            Some(bytes) => Ok(Some(Self::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        storage: &str,
        key: &str,
        response: &StoredResponse,
    ) -> Result<(), CacheError> {
        let bytes = Self::serialize(response)?;
        let mut storages = self
            .storages
            .lock()
            .map_err(|e| CacheError::Storage(e.to_string()))?;
        storages
            .entry(storage.to_string())
            .or_default()
            .insert(key.to_string(), bytes);
        Ok(())
    }

    async fn remove(&self, storage: &str, key: &str) -> Result<(), CacheError> {
        let mut storages = self
            .storages
            .lock()
            .map_err(|e| CacheError::Storage(e.to_string()))?;
        if let Some(entries) = storages.get_mut(storage) {
            entries.remove(key);
        }
        Ok(())
    }

    async fn contains(&self, storage: &str, key: &str) -> Result<bool, CacheError> {
        let storages = self
            .storages
            .lock()
            .map_err(|e| CacheError::Storage(e.to_string()))?;
        Ok(storages
            .get(storage)
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false))
    }

    async fn list_storages(&self) -> Result<Vec<String>, CacheError> {
        let storages = self
            .storages
            .lock()
            .map_err(|e| CacheError::Storage(e.to_string()))?;
        Ok(storages.keys().cloned().collect())
    }

    async fn drop_storage(&self, storage: &str) -> Result<(), CacheError> {
        let mut storages = self
            .storages
            .lock()
            .map_err(|e| CacheError::Storage(e.to_string()))?;
        storages.remove(storage);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let storages = self.storages.lock().unwrap();
        f.debug_struct("InMemoryCacheStore")
            .field("storages", &storages.len())
            .finish()
    }
}

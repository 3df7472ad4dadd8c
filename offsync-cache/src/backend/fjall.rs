//! Durable CacheStore backed by a fjall keyspace. Each namespace storage
//! maps to one partition, so activation-time eviction is a partition drop.
//! The worker may be terminated between any two events; every write is
//! persisted before the call returns.

use std::{
    collections::HashMap,
    path::Path,
    sync::Mutex,
};

use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};

use crate::{CacheError, CacheStore, StoredResponse};

pub struct FjallCacheStore {
    db: Keyspace,
    // Handles are cheap to clone; cache them per storage name.
    partitions: Mutex<HashMap<String, PartitionHandle>>,
}

impl FjallCacheStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let keyspace = Config::new(path).open()?;
        Ok(Self {
            db: keyspace,
            partitions: Mutex::new(HashMap::new()),
        })
    }

    fn partition(&self, storage: &str) -> Result<PartitionHandle, CacheError> {
        let mut partitions = self
            .partitions
            .lock()
            .map_err(|e| CacheError::Storage(e.to_string()))?;
        if let Some(handle) = partitions.get(storage) {
            return Ok(handle.clone());
        }
        let handle = self
            .db
            .open_partition(storage, PartitionCreateOptions::default())?;
        partitions.insert(storage.to_string(), handle.clone());
        Ok(handle)
    }

    fn storage_exists(&self, storage: &str) -> bool {
        self.db.partition_exists(storage)
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

#[async_trait]
impl CacheStore for FjallCacheStore {
    async fn get(
        &self,
        storage: &str,
        key: &str,
    ) -> Result<Option<StoredResponse>, CacheError> {
        if !self.storage_exists(storage) {
            return Ok(None);
        }
        let partition = self.partition(storage)?;
        match partition.get(key)? {
            Some(bytes) => Ok(Some(Self::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        storage: &str,
        key: &str,
        response: &StoredResponse,
    ) -> Result<(), CacheError> {
        let partition = self.partition(storage)?;
        let bytes = Self::serialize(response)?;
        partition.insert(key, &bytes)?;
        self.db.persist(PersistMode::SyncAll)?;
        Ok(())
    }

    async fn remove(&self, storage: &str, key: &str) -> Result<(), CacheError> {
        if !self.storage_exists(storage) {
            return Ok(());
        }
        let partition = self.partition(storage)?;
        partition.remove(key)?;
        self.db.persist(PersistMode::SyncAll)?;
        Ok(())
    }

    async fn contains(&self, storage: &str, key: &str) -> Result<bool, CacheError> {
        if !self.storage_exists(storage) {
            return Ok(false);
        }
        let partition = self.partition(storage)?;
        Ok(partition.get(key)?.is_some())
    }

    async fn list_storages(&self) -> Result<Vec<String>, CacheError> {
        Ok(self
            .db
            .list_partitions()
            .iter()
            .map(|name| name.to_string())
            .collect())
    }

    async fn drop_storage(&self, storage: &str) -> Result<(), CacheError> {
        if !self.storage_exists(storage) {
            return Ok(());
        }
        tracing::debug!(storage, "deleting cache partition");
        let handle = self.partition(storage)?;
        self.db.delete_partition(handle)?;
        let mut partitions = self
            .partitions
            .lock()
            .map_err(|e| CacheError::Storage(e.to_string()))?;
        partitions.remove(storage);
        Ok(())
    }
}

impl std::fmt::Debug for FjallCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FjallCacheStore").finish()
    }
}

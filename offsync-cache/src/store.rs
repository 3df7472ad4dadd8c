//! Storage trait for cache namespaces. A "storage" is one versioned
//! namespace ("api-v3"); entries inside it are keyed by canonicalized
//! request. Concurrent writers to the same key resolve last-write-wins at
//! this layer; callers must not add locking on top.

use async_trait::async_trait;
use std::sync::Arc;

use crate::{CacheError, StoredResponse};

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up an entry. An unknown storage name is a miss, not an error.
    async fn get(
        &self,
        storage: &str,
        key: &str,
    ) -> Result<Option<StoredResponse>, CacheError>;

    /// Insert or overwrite an entry. The later write wins.
    async fn put(
        &self,
        storage: &str,
        key: &str,
        response: &StoredResponse,
    ) -> Result<(), CacheError>;

    /// Remove a single entry. Removing a missing entry is not an error.
    async fn remove(&self, storage: &str, key: &str) -> Result<(), CacheError>;

    async fn contains(&self, storage: &str, key: &str) -> Result<bool, CacheError>;

    /// Names of every storage currently present, regardless of version.
    async fn list_storages(&self) -> Result<Vec<String>, CacheError>;

    /// Delete a whole storage and all its entries. Deleting a missing
    /// storage is not an error.
    async fn drop_storage(&self, storage: &str) -> Result<(), CacheError>;
}

pub type AbstractCacheStore = Arc<dyn CacheStore + Send + Sync>;

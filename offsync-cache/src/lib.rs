//! Versioned cache namespaces for the offline worker.
//!
//! Cached responses live in named storages ("shell-v3", "api-v3", ...),
//! one per namespace key and version. The `CacheStore` trait abstracts the
//! storage medium behind pluggable backends.
//!
//! Currently supported backends:
//! - in-memory (tests, ephemeral runs)
//! - fjall (durable, embedded)

mod backend;
mod entry;
mod error;
mod namespace;
mod store;

pub use backend::{FjallCacheStore, InMemoryCacheStore};
pub use entry::StoredResponse;
pub use error::CacheError;
pub use namespace::{NamespaceKey, NamespaceRegistry};
pub use store::{AbstractCacheStore, CacheStore};

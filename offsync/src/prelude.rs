pub use crate::config::WorkerConfig;
pub use crate::dispatch::{Dispatcher, Fallback, Route, Strategy};
pub use crate::fetcher::{AbstractFetcher, FetchError, Fetcher, HttpFetcher};
pub use crate::http::{Destination, Request, Response};
pub use crate::lifecycle::{ClientTakeover, LifecycleManager, WorkerState};
pub use crate::message::ControlMessage;
pub use crate::push::{ClickOutcome, Notification, NotificationPayload};
pub use crate::sync::{DrainOutcome, SYNC_PENDING_CHANGES};
pub use crate::worker::OfflineWorker;
pub use crate::WorkerError;
pub use offsync_cache::{
    AbstractCacheStore, CacheError, CacheStore, FjallCacheStore, InMemoryCacheStore,
    NamespaceKey, NamespaceRegistry, StoredResponse,
};
pub use offsync_queue::{
    AbstractMutationQueue, FjallMutationQueue, InMemoryMutationQueue,
    JsonSerializer, MutationId, MutationQueue, PendingMutation, QueueError,
};

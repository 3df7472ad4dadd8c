//! The four fetch strategies. Each is a behavior over (request, namespace)
//! with side effects on the cache store. Strategy selection happens in
//! `dispatch`; this module only executes.
//!
//! Storage failures degrade rather than propagate: a read error falls
//! through to the network path, a write error is logged and swallowed so
//! it can never fail the response the caller is waiting for.

use std::sync::Arc;

use offsync_cache::{CacheStore, NamespaceRegistry, StoredResponse};
use tracing::{debug, warn};

use crate::dispatch::{Fallback, Route, Strategy};
use crate::fetcher::{FetchError, Fetcher};
use crate::http::{
    Request, Response, CACHED_AT_HEADER, SERVED_FROM_CACHE_HEADER,
    SERVED_FROM_CACHE_VALUE,
};
use crate::WorkerError;

pub struct StrategyRunner {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    registry: NamespaceRegistry,
    offline_url: String,
    placeholder_image_url: String,
}

impl StrategyRunner {
    pub fn new(
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        registry: NamespaceRegistry,
        offline_url: String,
        placeholder_image_url: String,
    ) -> Self {
        Self {
            store,
            fetcher,
            registry,
            offline_url,
            placeholder_image_url,
        }
    }

    pub async fn run(
        &self,
        route: &Route,
        request: &Request,
    ) -> Result<Response, WorkerError> {
        let storage = self.registry.storage_name(route.namespace);
        match route.strategy {
            Strategy::CacheFirst => self.cache_first(&storage, route, request).await,
            Strategy::NetworkFirst => {
                self.network_first(&storage, route, request).await
            }
            Strategy::StaleWhileRevalidate => {
                self.stale_while_revalidate(&storage, route, request).await
            }
            Strategy::NetworkOnly => Ok(self.fetcher.fetch(request).await?),
        }
    }

    async fn cache_first(
        &self,
        storage: &str,
        route: &Route,
        request: &Request,
    ) -> Result<Response, WorkerError> {
        let key = request.cache_key();
        if let Some(stored) = self.lookup(storage, &key).await {
            return Ok(Response::from_stored(stored));
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.store_response(storage, &key, &response).await;
                }
                Ok(response)
            }
            Err(err) => self.fallback(route.fallback, err).await,
        }
    }

    async fn network_first(
        &self,
        storage: &str,
        route: &Route,
        request: &Request,
    ) -> Result<Response, WorkerError> {
        let key = request.cache_key();
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    let marked = response.clone().with_header(
                        CACHED_AT_HEADER,
                        &chrono::Utc::now().to_rfc3339(),
                    );
                    self.store_response(storage, &key, &marked).await;
                }
                Ok(response)
            }
            Err(err) => {
                if let Some(stored) = self.lookup(storage, &key).await {
                    debug!(key = %key, "network failed, serving cached copy");
                    return Ok(Response::from_stored(stored).with_header(
                        SERVED_FROM_CACHE_HEADER,
                        SERVED_FROM_CACHE_VALUE,
                    ));
                }
                self.fallback(route.fallback, err).await
            }
        }
    }

    /// Serve a cache hit immediately and refresh in the background; only a
    /// miss ever waits for the network. The refresh is a detached task:
    /// its completion and its errors are invisible to the caller.
    async fn stale_while_revalidate(
        &self,
        storage: &str,
        route: &Route,
        request: &Request,
    ) -> Result<Response, WorkerError> {
        let key = request.cache_key();
        if let Some(stored) = self.lookup(storage, &key).await {
            self.spawn_revalidate(storage.to_string(), key, request.clone());
            return Ok(Response::from_stored(stored));
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.store_response(storage, &key, &response).await;
                }
                Ok(response)
            }
            Err(err) => self.fallback(route.fallback, err).await,
        }
    }

    fn spawn_revalidate(&self, storage: String, key: String, request: Request) {
        let store = Arc::clone(&self.store);
        let fetcher = Arc::clone(&self.fetcher);
        tokio::spawn(async move {
            match fetcher.fetch(&request).await {
                Ok(response) if response.is_success() => {
                    if let Err(err) =
                        store.put(&storage, &key, &response.to_stored()).await
                    {
                        warn!(key = %key, %err, "background refresh write failed");
                    }
                }
                Ok(response) => {
                    debug!(key = %key, status = response.status, "background refresh skipped");
                }
                Err(err) => {
                    debug!(key = %key, %err, "background refresh failed");
                }
            }
        });
    }

    /// Read errors degrade to a miss so the request continues on the
    /// network-only path.
    async fn lookup(&self, storage: &str, key: &str) -> Option<StoredResponse> {
        match self.store.get(storage, key).await {
            Ok(found) => found,
            Err(err) => {
                warn!(storage, key, %err, "cache read failed, degrading to network");
                None
            }
        }
    }

    /// Write errors are logged and swallowed; the response the user is
    /// waiting for must never fail because of them.
    async fn store_response(&self, storage: &str, key: &str, response: &Response) {
        if let Err(err) = self.store.put(storage, key, &response.to_stored()).await {
            warn!(storage, key, %err, "cache write failed");
        }
    }

    async fn fallback(
        &self,
        fallback: Fallback,
        err: FetchError,
    ) -> Result<Response, WorkerError> {
        match fallback {
            Fallback::None => Err(err.into()),
            Fallback::PlaceholderImage => {
                // the placeholder is part of the precache manifest, so it
                // sits in the shell storage under its path-only key
                let storage =
                    self.registry.storage_name(offsync_cache::NamespaceKey::Shell);
                let key = format!("GET {}", self.placeholder_image_url);
                if let Some(stored) = self.lookup(&storage, &key).await {
                    return Ok(Response::from_stored(stored));
                }
                Ok(Response::redirect(&self.placeholder_image_url))
            }
            Fallback::OfflineDocument => {
                let storage =
                    self.registry.storage_name(offsync_cache::NamespaceKey::Shell);
                if let Some(stored) = self.offline_document(&storage).await {
                    return Ok(Response::from_stored(stored));
                }
                Ok(Response::synthetic_unavailable("offline"))
            }
            Fallback::SyntheticApiError => Ok(Response::synthetic_unavailable(
                "You are offline and this data has not been cached yet",
            )),
        }
    }

    async fn offline_document(&self, storage: &str) -> Option<StoredResponse> {
        // install stores precache entries under path-only keys
        self.lookup(storage, &format!("GET {}", self.offline_url)).await
    }
}

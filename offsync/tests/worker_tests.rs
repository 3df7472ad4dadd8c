//! End-to-end tests of the worker facade: strategies behind the
//! dispatcher, offline mutation capture, sync drains and control
//! messages, all against an in-memory store and a scripted fetcher.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use offsync::dispatch::{Fallback, Route, Strategy};
use offsync::fetcher::{FetchError, Fetcher};
use offsync::http::{Destination, Request, Response, SERVED_FROM_CACHE_HEADER};
use offsync::lifecycle::WorkerState;
use offsync::prelude::*;
use offsync::strategy::StrategyRunner;

/// Per-path scripted behavior, switchable mid-test.
#[derive(Clone)]
enum Served {
    Body(u16, String),
    Offline,
    /// Never resolves; used to prove stale-while-revalidate does not wait
    /// for the network.
    Hang,
}

struct ScriptedFetcher {
    routes: Mutex<HashMap<String, Served>>,
    default: Served,
}

impl ScriptedFetcher {
    fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            default: Served::Body(200, "ok".to_string()),
        }
    }

    fn offline() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            default: Served::Offline,
        }
    }

    fn set(&self, path: &str, served: Served) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), served);
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let served = {
            let routes = self.routes.lock().unwrap();
            routes
                .get(request.url.path())
                .cloned()
                .unwrap_or_else(|| self.default.clone())
        };
        match served {
            Served::Body(status, body) => Ok(Response::new(status, body.into_bytes())),
            Served::Offline => Err(FetchError::Connectivity("offline".into())),
            Served::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

struct Harness {
    worker: OfflineWorker,
    store: Arc<InMemoryCacheStore>,
    queue: Arc<InMemoryMutationQueue<JsonSerializer>>,
    fetcher: Arc<ScriptedFetcher>,
}

async fn active_worker(fetcher: ScriptedFetcher) -> Harness {
    let store = Arc::new(InMemoryCacheStore::new());
    let queue = Arc::new(InMemoryMutationQueue::<JsonSerializer>::new());
    let fetcher = Arc::new(fetcher);

    let mut worker = OfflineWorker::new(
        WorkerConfig::default(),
        store.clone(),
        queue.clone(),
        fetcher.clone(),
    )
    .unwrap();
    worker.handle_install().await.unwrap();
    worker.handle_activate().await.unwrap();

    Harness {
        worker,
        store,
        queue,
        fetcher,
    }
}

fn seed_key(path_or_url: &str) -> String {
    format!("GET {path_or_url}")
}

#[tokio::test]
async fn idempotent_caching_keeps_the_later_entry() {
    let h = active_worker(ScriptedFetcher::new()).await;
    let req = Request::get(url("https://market.local/api/v1/listings"));

    h.fetcher
        .set("/api/v1/listings", Served::Body(200, "first".into()));
    h.worker.handle_fetch(req.clone()).await.unwrap();

    h.fetcher
        .set("/api/v1/listings", Served::Body(200, "second".into()));
    h.worker.handle_fetch(req.clone()).await.unwrap();

    let stored = h
        .store
        .get("api-v1", &req.cache_key())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.body, b"second");
}

#[tokio::test]
async fn stale_while_revalidate_does_not_wait_for_the_network() {
    let h = active_worker(ScriptedFetcher::new()).await;
    let req = Request::get(url("https://market.local/api/v1/marketplace/categories"));

    // populated cache entry, network that never resolves
    h.store
        .put(
            "api-v1",
            &req.cache_key(),
            &StoredResponse::new(200, b"cached categories".to_vec()),
        )
        .await
        .unwrap();
    h.fetcher
        .set("/api/v1/marketplace/categories", Served::Hang);

    let response = tokio::time::timeout(
        Duration::from_millis(250),
        h.worker.handle_fetch(req),
    )
    .await
    .expect("strategy must not block on the network")
    .unwrap();
    assert_eq!(response.body, b"cached categories");
}

#[tokio::test]
async fn stale_while_revalidate_awaits_network_on_a_miss() {
    let h = active_worker(ScriptedFetcher::new()).await;
    let req = Request::get(url("https://market.local/api/v1/marketplace/categories"));
    h.fetcher.set(
        "/api/v1/marketplace/categories",
        Served::Body(200, "fresh".into()),
    );

    let response = h.worker.handle_fetch(req.clone()).await.unwrap();
    assert_eq!(response.body, b"fresh");

    // and the response was cached for next time
    let stored = h.store.get("api-v1", &req.cache_key()).await.unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn network_first_strategy_falls_back_to_cache() {
    // exercises the strategy itself on the path named by the contract
    let store: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());
    let fetcher: Arc<dyn Fetcher> = Arc::new(ScriptedFetcher::offline());
    let runner = StrategyRunner::new(
        store.clone(),
        fetcher,
        NamespaceRegistry::new(1),
        "/offline.html".into(),
        "/images/placeholder.png".into(),
    );
    let req = Request::get(url("https://market.local/api/v1/marketplace/categories"));
    store
        .put(
            "api-v1",
            &req.cache_key(),
            &StoredResponse::new(200, b"cached".to_vec()),
        )
        .await
        .unwrap();

    let route = Route {
        strategy: Strategy::NetworkFirst,
        namespace: NamespaceKey::Api,
        fallback: Fallback::SyntheticApiError,
    };
    let response = runner.run(&route, &req).await.unwrap();
    assert_eq!(response.body, b"cached");
    assert_eq!(response.header(SERVED_FROM_CACHE_HEADER), Some("cache"));
}

#[tokio::test]
async fn api_failure_without_cache_yields_synthetic_503() {
    let h = active_worker(ScriptedFetcher::new()).await;
    h.fetcher.set("/api/v1/listings", Served::Offline);

    let response = h
        .worker
        .handle_fetch(Request::get(url("https://market.local/api/v1/listings")))
        .await
        .unwrap();
    assert_eq!(response.status, 503);
    assert_eq!(response.header("content-type"), Some("application/json"));
    let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn navigation_failure_serves_the_offline_document() {
    let h = active_worker(ScriptedFetcher::new()).await;
    h.fetcher.set("/listings/42", Served::Offline);

    let response = h
        .worker
        .handle_fetch(
            Request::get(url("https://market.local/listings/42"))
                .with_destination(Destination::Document),
        )
        .await
        .unwrap();
    // /offline.html was precached during install
    assert_eq!(response.body, b"ok");
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn image_failure_serves_the_precached_placeholder() {
    let fetcher = ScriptedFetcher::new();
    fetcher.set(
        "/images/placeholder.png",
        Served::Body(200, "placeholder bytes".into()),
    );
    let h = active_worker(fetcher).await;

    // fully offline: neither the image nor the placeholder is reachable
    h.fetcher.set("/uploads/photo-9.webp", Served::Offline);
    h.fetcher.set("/images/placeholder.png", Served::Offline);

    let response = h
        .worker
        .handle_fetch(Request::get(url("https://market.local/uploads/photo-9.webp")))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"placeholder bytes");
}

#[tokio::test]
async fn image_failure_without_a_precached_placeholder_redirects() {
    // runner-level: empty store, so even the fallback lookup misses
    let store: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());
    let fetcher: Arc<dyn Fetcher> = Arc::new(ScriptedFetcher::offline());
    let runner = StrategyRunner::new(
        store,
        fetcher,
        NamespaceRegistry::new(1),
        "/offline.html".into(),
        "/images/placeholder.png".into(),
    );
    let route = Route {
        strategy: Strategy::CacheFirst,
        namespace: NamespaceKey::Image,
        fallback: Fallback::PlaceholderImage,
    };
    let response = runner
        .run(&route, &Request::get(url("https://market.local/uploads/photo-9.webp")))
        .await
        .unwrap();
    assert_eq!(response.status, 302);
    assert_eq!(response.header("location"), Some("/images/placeholder.png"));
}

#[tokio::test]
async fn activation_evicts_previous_version_storages() {
    let store = Arc::new(InMemoryCacheStore::new());
    let entry = StoredResponse::new(200, b"x".to_vec());
    for name in ["shell-v0", "runtime-v0", "api-v0"] {
        store.put(name, "k", &entry).await.unwrap();
    }

    let mut worker = OfflineWorker::new(
        WorkerConfig::default(), // cache_version = 1
        store.clone(),
        Arc::new(InMemoryMutationQueue::<JsonSerializer>::new()),
        Arc::new(ScriptedFetcher::new()),
    )
    .unwrap();
    worker.handle_install().await.unwrap();
    worker.handle_activate().await.unwrap();

    let names = store.list_storages().await.unwrap();
    assert!(names.iter().all(|n| n.ends_with("-v1")));
}

#[tokio::test]
async fn offline_mutation_is_queued_and_acked_with_202() {
    let h = active_worker(ScriptedFetcher::new()).await;
    h.fetcher.set("/api/v1/orders", Served::Offline);

    let response = h
        .worker
        .handle_fetch(
            Request::new("POST", url("https://market.local/api/v1/orders"))
                .with_body(b"{\"listing\":42}".to_vec()),
        )
        .await
        .unwrap();
    assert_eq!(response.status, 202);
    assert_eq!(h.queue.len().await.unwrap(), 1);

    let queued = h.queue.pop().await.unwrap();
    assert_eq!(queued.method, "POST");
    assert_eq!(queued.endpoint, "https://market.local/api/v1/orders");
    assert_eq!(queued.body.as_deref(), Some(&b"{\"listing\":42}"[..]));
}

#[tokio::test]
async fn drain_is_fifo_and_isolates_failures() {
    let h = active_worker(ScriptedFetcher::new()).await;
    h.fetcher.set("/api/v1/orders", Served::Offline);
    h.fetcher.set("/api/v1/reviews", Served::Offline);

    // capture A then B while offline
    let a = h
        .worker
        .handle_fetch(Request::new("POST", url("https://market.local/api/v1/orders")))
        .await
        .unwrap();
    assert_eq!(a.status, 202);
    h.worker
        .handle_fetch(Request::new("POST", url("https://market.local/api/v1/reviews")))
        .await
        .unwrap();

    // back online, but A's endpoint still fails
    h.fetcher.set("/api/v1/reviews", Served::Body(201, "".into()));

    let outcome = h.worker.handle_sync(SYNC_PENDING_CHANGES).await.unwrap();
    assert_eq!(outcome.replayed, 1);
    assert_eq!(outcome.retained, 1);

    let remaining = h.queue.pop().await.unwrap();
    assert_eq!(remaining.endpoint, "https://market.local/api/v1/orders");
    assert_eq!(remaining.attempts, 1);
}

#[tokio::test]
async fn foreign_sync_tags_do_not_drain() {
    let h = active_worker(ScriptedFetcher::new()).await;
    h.fetcher.set("/api/v1/orders", Served::Offline);
    h.worker
        .handle_fetch(Request::new("POST", url("https://market.local/api/v1/orders")))
        .await
        .unwrap();

    let outcome = h.worker.handle_sync("periodic-refresh").await.unwrap();
    assert_eq!(outcome, DrainOutcome::default());
    assert_eq!(h.queue.len().await.unwrap(), 1);
}

#[tokio::test]
async fn queued_mutation_replays_once_connectivity_returns() {
    let h = active_worker(ScriptedFetcher::new()).await;
    h.fetcher.set("/api/v1/orders", Served::Offline);
    h.worker
        .handle_fetch(Request::new("POST", url("https://market.local/api/v1/orders")))
        .await
        .unwrap();

    h.fetcher
        .set("/api/v1/orders", Served::Body(201, "".into()));
    let outcome = h.worker.handle_sync(SYNC_PENDING_CHANGES).await.unwrap();
    assert_eq!(outcome.replayed, 1);
    assert!(h.queue.is_empty().await.unwrap());
}

#[tokio::test]
async fn failed_install_leaves_no_active_shell() {
    let fetcher = ScriptedFetcher::new();
    fetcher.set("/manifest.json", Served::Offline);

    let store = Arc::new(InMemoryCacheStore::new());
    let mut worker = OfflineWorker::new(
        WorkerConfig::default(),
        store.clone(),
        Arc::new(InMemoryMutationQueue::<JsonSerializer>::new()),
        Arc::new(fetcher),
    )
    .unwrap();

    assert!(worker.handle_install().await.is_err());
    assert_eq!(worker.state(), WorkerState::InstallFailed);
    assert!(!store
        .list_storages()
        .await
        .unwrap()
        .contains(&"shell-v1".to_string()));
}

#[tokio::test]
async fn fetch_before_activation_is_not_intercepted() {
    let fetcher = ScriptedFetcher::new();
    fetcher.set("/api/v1/listings", Served::Body(200, "live".into()));

    let store = Arc::new(InMemoryCacheStore::new());
    let worker = OfflineWorker::new(
        WorkerConfig::default(),
        store.clone(),
        Arc::new(InMemoryMutationQueue::<JsonSerializer>::new()),
        Arc::new(fetcher),
    )
    .unwrap();

    let response = worker
        .handle_fetch(Request::get(url("https://market.local/api/v1/listings")))
        .await
        .unwrap();
    assert_eq!(response.body, b"live");
    // nothing was cached: the worker is not yet in control
    assert!(store.list_storages().await.unwrap().is_empty());
}

#[tokio::test]
async fn mutations_before_activation_are_not_queued() {
    let queue = Arc::new(InMemoryMutationQueue::<JsonSerializer>::new());
    let worker = OfflineWorker::new(
        WorkerConfig::default(),
        Arc::new(InMemoryCacheStore::new()),
        queue.clone(),
        Arc::new(ScriptedFetcher::offline()),
    )
    .unwrap();

    // not yet active: the failure propagates instead of being captured
    let result = worker
        .handle_fetch(Request::new("POST", url("https://market.local/api/v1/orders")))
        .await;
    assert!(result.is_err());
    assert!(queue.is_empty().await.unwrap());
}

#[tokio::test]
async fn skip_activation_message_forces_takeover() {
    let store = Arc::new(InMemoryCacheStore::new());
    let mut worker = OfflineWorker::new(
        WorkerConfig::default(),
        store,
        Arc::new(InMemoryMutationQueue::<JsonSerializer>::new()),
        Arc::new(ScriptedFetcher::new()),
    )
    .unwrap();
    worker.handle_install().await.unwrap();

    worker
        .handle_message(r#"{"type":"SKIP_ACTIVATION"}"#)
        .await
        .unwrap();
    assert_eq!(worker.state(), WorkerState::Active);
}

#[tokio::test]
async fn clear_all_caches_message_deletes_every_storage() {
    let h = active_worker(ScriptedFetcher::new()).await;
    let mut worker = h.worker;
    assert!(!h.store.list_storages().await.unwrap().is_empty());

    worker
        .handle_message(r#"{"type":"CLEAR_ALL_CACHES"}"#)
        .await
        .unwrap();
    assert!(h.store.list_storages().await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_control_messages_are_ignored() {
    let h = active_worker(ScriptedFetcher::new()).await;
    let mut worker = h.worker;
    worker.handle_message("garbage").await.unwrap();
    worker.handle_message(r#"{"type":"UNKNOWN"}"#).await.unwrap();
    assert_eq!(worker.state(), WorkerState::Active);
}

#[tokio::test]
async fn push_and_click_round_trip() {
    let h = active_worker(ScriptedFetcher::new()).await;

    let notification = h.worker.handle_push(Some(b"Order #8 confirmed"));
    assert_eq!(notification.payload.body, "Order #8 confirmed");

    let outcome = h.worker.handle_notification_click(Some("open"));
    assert!(outcome.close);
    assert_eq!(outcome.navigate.as_deref(), Some("/"));

    let outcome = h.worker.handle_notification_click(Some("dismiss"));
    assert!(outcome.close);
    assert!(outcome.navigate.is_none());
}

#[tokio::test]
async fn seeded_cache_entry_key_matches_request_key() {
    // guards the canonical key format used by the other tests
    let req = Request::get(url("https://market.local/api/v1/listings"));
    assert_eq!(
        req.cache_key(),
        seed_key("https://market.local/api/v1/listings")
    );
}

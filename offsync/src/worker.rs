//! The event-handler facade. One async handler per platform event type;
//! the host wires each event to the matching method. No handler assumes
//! exclusive access to shared storage across an await point.

use std::sync::Arc;

use offsync_cache::{CacheStore, NamespaceRegistry};
use offsync_queue::{MutationQueue, PendingMutation};
use tracing::{debug, info};
use url::Url;

use crate::config::WorkerConfig;
use crate::dispatch::Dispatcher;
use crate::fetcher::{FetchError, Fetcher};
use crate::http::{Request, Response};
use crate::lifecycle::{ClientTakeover, LifecycleManager, WorkerState};
use crate::message::ControlMessage;
use crate::push::{self, ClickOutcome, Notification, NotificationPayload};
use crate::strategy::StrategyRunner;
use crate::sync::{self, DrainOutcome};
use crate::WorkerError;

pub struct OfflineWorker {
    config: WorkerConfig,
    dispatcher: Dispatcher,
    lifecycle: LifecycleManager,
    runner: StrategyRunner,
    store: Arc<dyn CacheStore>,
    queue: Arc<dyn MutationQueue>,
    fetcher: Arc<dyn Fetcher>,
}

impl OfflineWorker {
    pub fn new(
        config: WorkerConfig,
        store: Arc<dyn CacheStore>,
        queue: Arc<dyn MutationQueue>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, WorkerError> {
        let registry = NamespaceRegistry::new(config.cache_version);
        let base_url = Url::parse(&config.base_url)?;
        let dispatcher = Dispatcher::new(&config)?;
        let lifecycle = LifecycleManager::new(
            registry.clone(),
            Arc::clone(&store),
            Arc::clone(&fetcher),
            base_url,
        );
        let runner = StrategyRunner::new(
            Arc::clone(&store),
            Arc::clone(&fetcher),
            registry,
            config.offline_url.clone(),
            config.placeholder_image_url.clone(),
        );

        Ok(Self {
            config,
            dispatcher,
            lifecycle,
            runner,
            store,
            queue,
            fetcher,
        })
    }

    pub fn state(&self) -> WorkerState {
        self.lifecycle.state()
    }

    pub async fn handle_install(&mut self) -> Result<(), WorkerError> {
        self.lifecycle.install(&self.config.precache_manifest).await
    }

    pub async fn handle_activate(&mut self) -> Result<ClientTakeover, WorkerError> {
        self.lifecycle.activate().await
    }

    /// Entry point for every intercepted request.
    ///
    /// Every request passes the active gate first; before activation
    /// nothing is intercepted, mutations included. Once active, GETs go
    /// through the dispatcher to a strategy, and mutations go straight to
    /// network with a connectivity failure turning them into queued
    /// pending mutations acknowledged with a 202.
    pub async fn handle_fetch(&self, request: Request) -> Result<Response, WorkerError> {
        if self.lifecycle.state() != WorkerState::Active {
            // not yet in control of this client; do not intercept
            return Ok(self.fetcher.fetch(&request).await?);
        }
        if !request.is_get() {
            return self.forward_mutation(request).await;
        }
        match self.dispatcher.route(&request) {
            Some(route) => self.runner.run(&route, &request).await,
            None => Ok(self.fetcher.fetch(&request).await?),
        }
    }

    async fn forward_mutation(&self, request: Request) -> Result<Response, WorkerError> {
        match self.fetcher.fetch(&request).await {
            Ok(response) => Ok(response),
            Err(FetchError::Connectivity(reason)) => {
                let mutation = PendingMutation::new(
                    request.url.to_string(),
                    request.method.clone(),
                    request.headers.clone(),
                    request.body.clone(),
                );
                info!(id = %mutation.id, %reason, "queuing mutation made while offline");
                self.queue.push(&mutation).await?;
                Ok(Response::queued_ack(&mutation.id))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Sync triggers carry a tag; only the configured tag drains the
    /// queue, everything else is ignored.
    pub async fn handle_sync(&self, tag: &str) -> Result<DrainOutcome, WorkerError> {
        if tag != self.config.sync_tag {
            debug!(tag, "ignoring sync trigger with unknown tag");
            return Ok(DrainOutcome::default());
        }
        sync::drain(&self.queue, &self.fetcher).await
    }

    pub fn handle_push(&self, raw: Option<&[u8]>) -> Notification {
        Notification {
            title: self.config.notification_title.clone(),
            payload: NotificationPayload::parse(raw),
        }
    }

    pub fn handle_notification_click(&self, action: Option<&str>) -> ClickOutcome {
        push::handle_click(action)
    }

    /// Control messages from the application. Unknown or malformed input
    /// does nothing.
    pub async fn handle_message(&mut self, raw: &str) -> Result<(), WorkerError> {
        match ControlMessage::parse(raw) {
            Some(ControlMessage::SkipActivation) => {
                self.lifecycle.skip_waiting().await?;
                Ok(())
            }
            Some(ControlMessage::ClearAllCaches) => self.clear_all_caches().await,
            None => {
                debug!(raw, "ignoring unrecognized control message");
                Ok(())
            }
        }
    }

    async fn clear_all_caches(&self) -> Result<(), WorkerError> {
        for name in self.store.list_storages().await? {
            info!(storage = %name, "clearing cache storage");
            self.store.drop_storage(&name).await?;
        }
        Ok(())
    }
}

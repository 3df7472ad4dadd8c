//! # offsync - offline caching and resynchronization worker
//!
//! `offsync` is the offline layer of a marketplace web client: it sits
//! between the application and the network, decides a caching strategy per
//! request class, keeps versioned cache namespaces, queues mutations made
//! while offline and replays them when connectivity returns, and turns
//! push payloads into notifications.
//!
//! The worker has no public API for arbitrary callers; its surface is the
//! set of platform events it reacts to, one async handler per event type
//! on [`OfflineWorker`]:
//!
//! - install / activate (lifecycle, precaching, stale-namespace eviction)
//! - fetch (strategy dispatch per request class)
//! - sync (drain the pending-mutation queue)
//! - push / notification click
//! - control messages from the application
//!
//! Execution is single-threaded and event-driven: the host may suspend or
//! terminate the worker between any two events, so everything that must
//! survive (queued mutations, cache contents) lives in durable storage
//! behind the `offsync-cache` and `offsync-queue` crates.
//!
//! ## Modules
//!
//! - `config`: build-time constants (precache manifest, allow-lists).
//! - `dispatch`: request classification into strategy routes.
//! - `strategy`: the four fetch strategies.
//! - `lifecycle`: install/activate state machine.
//! - `sync`: queue drain on sync triggers.
//! - `push`: push payloads and notification interaction.
//! - `worker`: the event-handler facade tying it all together.

pub mod config;
pub mod dispatch;
pub mod fetcher;
pub mod http;
pub mod lifecycle;
pub mod logging;
pub mod message;
pub mod prelude;
pub mod push;
pub mod strategy;
pub mod sync;
pub mod worker;

use thiserror::Error;

use lifecycle::WorkerState;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Cache error: {0}")]
    Cache(#[from] offsync_cache::CacheError),
    #[error("Queue error: {0}")]
    Queue(#[from] offsync_queue::QueueError),
    #[error("Fetch error: {0}")]
    Fetch(#[from] fetcher::FetchError),
    #[error("Invalid lifecycle transition: {from:?} -> {to:?}")]
    InvalidTransition { from: WorkerState, to: WorkerState },
    #[error("Install failed: {0}")]
    InstallFailed(String),
    #[error("Classification rule error: {0}")]
    Rule(#[from] regex::Error),
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

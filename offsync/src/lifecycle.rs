//! Install/activate state machine.
//!
//! Install precaches the manifest into the new shell storage; if any fetch
//! fails the whole attempt is rolled back so a previous active version
//! stays in control. Activation evicts every storage whose name is not in
//! the current versioned set, then takes over open clients.

use std::sync::Arc;

use offsync_cache::{CacheStore, NamespaceKey, NamespaceRegistry};
use tracing::{info, warn};
use url::Url;

use crate::fetcher::Fetcher;
use crate::WorkerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Installing,
    Installed,
    Activating,
    Active,
    InstallFailed,
}

/// Whether activation claimed the currently open clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientTakeover {
    Claimed,
    NotClaimed,
}

fn is_valid_transition(from: WorkerState, to: WorkerState) -> bool {
    use WorkerState::*;
    matches!(
        (from, to),
        (Installing, Installed)
            | (Installing, InstallFailed)
            | (Installed, Activating)
            | (Activating, Active)
    )
}

pub struct LifecycleManager {
    state: WorkerState,
    registry: NamespaceRegistry,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    base_url: Url,
}

impl LifecycleManager {
    pub fn new(
        registry: NamespaceRegistry,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        base_url: Url,
    ) -> Self {
        Self {
            state: WorkerState::Installing,
            registry,
            store,
            fetcher,
            base_url,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    fn transition(&mut self, to: WorkerState) -> Result<(), WorkerError> {
        if !is_valid_transition(self.state, to) {
            return Err(WorkerError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        info!(from = ?self.state, to = ?to, "lifecycle transition");
        self.state = to;
        Ok(())
    }

    /// Precache every manifest URL into the new shell storage. All or
    /// nothing: on any failure the partially filled storage is dropped and
    /// the state becomes `InstallFailed`, leaving the previous version's
    /// storages untouched.
    pub async fn install(&mut self, manifest: &[String]) -> Result<(), WorkerError> {
        if self.state != WorkerState::Installing {
            return Err(WorkerError::InvalidTransition {
                from: self.state,
                to: WorkerState::Installed,
            });
        }
        let shell = self.registry.storage_name(NamespaceKey::Shell);

        for path in manifest {
            match self.precache_one(&shell, path).await {
                Ok(()) => {}
                Err(err) => {
                    warn!(%path, %err, "precache failed, rolling back install");
                    if let Err(drop_err) = self.store.drop_storage(&shell).await {
                        warn!(%drop_err, "rollback of shell storage failed");
                    }
                    self.transition(WorkerState::InstallFailed)?;
                    return Err(WorkerError::InstallFailed(format!(
                        "precache of {path} failed: {err}"
                    )));
                }
            }
        }

        self.transition(WorkerState::Installed)
    }

    async fn precache_one(&self, shell: &str, path: &str) -> Result<(), WorkerError> {
        let url = self.base_url.join(path)?;
        let request = crate::http::Request::get(url);
        let response = self.fetcher.fetch(&request).await?;
        if !response.is_success() {
            return Err(WorkerError::InstallFailed(format!(
                "unexpected status {} for {path}",
                response.status
            )));
        }
        // path-only key so fallbacks can find precached documents without
        // knowing the origin
        self.store
            .put(shell, &format!("GET {path}"), &response.to_stored())
            .await?;
        Ok(())
    }

    /// Evict storages from older versions, then take over open clients so
    /// the new version governs requests without a reload.
    pub async fn activate(&mut self) -> Result<ClientTakeover, WorkerError> {
        self.transition(WorkerState::Activating)?;

        for name in self.store.list_storages().await? {
            if !self.registry.is_current(&name) {
                info!(storage = %name, "evicting stale cache storage");
                self.store.drop_storage(&name).await?;
            }
        }

        self.transition(WorkerState::Active)?;
        Ok(ClientTakeover::Claimed)
    }

    /// Immediate-takeover control message. Only acts once an install has
    /// completed; called mid-install it does nothing, so an in-progress
    /// install can never be corrupted.
    pub async fn skip_waiting(&mut self) -> Result<ClientTakeover, WorkerError> {
        if self.state != WorkerState::Installed {
            info!(state = ?self.state, "skip-activation ignored");
            return Ok(ClientTakeover::NotClaimed);
        }
        self.activate().await
    }
}

//! Build-time constants of the worker: cache version, precache manifest,
//! critical-API allow-list, fallback URLs. All of it is static in
//! production; the YAML loader exists so deployments can override the
//! defaults without a rebuild.

use serde::Deserialize;
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Version baked into every namespace storage name. Bump on deploy.
    pub cache_version: u32,
    /// Origin the app is served from; manifest paths resolve against it.
    pub base_url: String,
    /// Prefix marking API requests.
    pub api_prefix: String,
    /// Path fragments eligible for stale-while-revalidate instead of
    /// network-first. Small, hot, rarely-changing listings.
    pub critical_api_paths: Vec<String>,
    /// Path fragments that must never be cached (real-time and
    /// mutation-adjacent reads).
    pub excluded_paths: Vec<String>,
    /// URLs that must be cached in the shell namespace after install.
    pub precache_manifest: Vec<String>,
    /// Document served when a navigation cannot be satisfied.
    pub offline_url: String,
    /// Image served when an image can be fetched neither from cache nor
    /// from network.
    pub placeholder_image_url: String,
    /// Only this sync-trigger tag drains the mutation queue.
    pub sync_tag: String,
    /// Title used for displayed notifications.
    pub notification_title: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_version: 1,
            base_url: "http://localhost:3000".to_string(),
            api_prefix: "/api/".to_string(),
            critical_api_paths: vec![
                "/api/v1/marketplace/categories".to_string(),
                "/api/v1/marketplace/attributes".to_string(),
            ],
            excluded_paths: vec![
                "/api/v1/chat".to_string(),
                "/api/v1/notifications".to_string(),
            ],
            precache_manifest: vec![
                "/".to_string(),
                "/offline.html".to_string(),
                "/manifest.json".to_string(),
                "/icons/icon-192x192.png".to_string(),
                "/icons/icon-512x512.png".to_string(),
                "/images/placeholder.png".to_string(),
            ],
            offline_url: "/offline.html".to_string(),
            placeholder_image_url: "/images/placeholder.png".to_string(),
            sync_tag: crate::sync::SYNC_PENDING_CHANGES.to_string(),
            notification_title: "Marketplace".to_string(),
        }
    }
}

impl WorkerConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }
}

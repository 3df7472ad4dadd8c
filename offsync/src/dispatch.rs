//! Request classification. Every intercepted GET is matched against an
//! ordered rule list and mapped to a strategy, a cache namespace and a
//! fallback. Non-GET requests are not routed at all; the worker forwards
//! them to the network and captures failures into the mutation queue.

use offsync_cache::NamespaceKey;
use regex::Regex;

use crate::config::WorkerConfig;
use crate::http::{Destination, Request};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
    NetworkOnly,
}

/// What to answer when both cache and network fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    None,
    PlaceholderImage,
    OfflineDocument,
    SyntheticApiError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub strategy: Strategy,
    pub namespace: NamespaceKey,
    pub fallback: Fallback,
}

impl Route {
    fn new(strategy: Strategy, namespace: NamespaceKey, fallback: Fallback) -> Self {
        Self {
            strategy,
            namespace,
            fallback,
        }
    }
}

pub struct Dispatcher {
    image_pattern: Regex,
    api_prefix: String,
    critical_api_paths: Vec<String>,
    excluded_paths: Vec<String>,
}

impl Dispatcher {
    pub fn new(config: &WorkerConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            image_pattern: Regex::new(
                r"(?i)\.(png|jpe?g|gif|webp|svg|ico|avif)$",
            )?,
            api_prefix: config.api_prefix.clone(),
            critical_api_paths: config.critical_api_paths.clone(),
            excluded_paths: config.excluded_paths.clone(),
        })
    }

    /// Classify a request. `None` means pass through untouched (non-GET).
    pub fn route(&self, request: &Request) -> Option<Route> {
        if !request.is_get() {
            return None;
        }
        let path = request.url.path();

        if request.destination == Destination::Image
            || self.image_pattern.is_match(path)
        {
            return Some(Route::new(
                Strategy::CacheFirst,
                NamespaceKey::Image,
                Fallback::PlaceholderImage,
            ));
        }

        if self.excluded_paths.iter().any(|frag| path.starts_with(frag)) {
            return Some(Route::new(
                Strategy::NetworkOnly,
                NamespaceKey::Api,
                Fallback::None,
            ));
        }

        if self
            .critical_api_paths
            .iter()
            .any(|frag| path.starts_with(frag))
        {
            return Some(Route::new(
                Strategy::StaleWhileRevalidate,
                NamespaceKey::Api,
                Fallback::None,
            ));
        }

        if path.starts_with(&self.api_prefix) {
            return Some(Route::new(
                Strategy::NetworkFirst,
                NamespaceKey::Api,
                Fallback::SyntheticApiError,
            ));
        }

        if request.destination == Destination::Document {
            return Some(Route::new(
                Strategy::NetworkFirst,
                NamespaceKey::Shell,
                Fallback::OfflineDocument,
            ));
        }

        // scripts, styles, fonts, anything else
        Some(Route::new(
            Strategy::StaleWhileRevalidate,
            NamespaceKey::Runtime,
            Fallback::None,
        ))
    }
}

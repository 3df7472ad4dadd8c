//! Request/response model the worker operates on. Deliberately small:
//! method, url, headers, body, plus the destination hint the host gives
//! us for GETs (document, image, script, ...).

use std::collections::BTreeMap;

use chrono::Utc;
use offsync_cache::StoredResponse;
use serde_json::json;
use url::Url;

/// Marker added to a cached copy served because the network failed, so the
/// UI can show a degraded-mode banner.
pub const SERVED_FROM_CACHE_HEADER: &str = "x-served-from";
pub const SERVED_FROM_CACHE_VALUE: &str = "cache";

/// Capture-timestamp marker written by network-first when it stores an API
/// response.
pub const CACHED_AT_HEADER: &str = "x-cached-at";

/// What kind of resource the host says a GET is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Full-document navigation
    Document,
    Image,
    Script,
    Style,
    Other,
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub destination: Destination,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: &str, url: Url) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            url,
            destination: Destination::Other,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Canonical cache key: method plus the url without its fragment.
    pub fn cache_key(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        format!("{} {}", self.method, url)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|v| v.as_str())
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string().into_bytes())
            .with_header("content-type", "application/json")
    }

    /// Synthetic answer for an uncachable API failure: nothing in the
    /// cache and no network.
    pub fn synthetic_unavailable(message: &str) -> Self {
        Self::json(503, &json!({ "error": message }))
    }

    /// Ack for a mutation captured into the queue while offline.
    pub fn queued_ack(id: &offsync_queue::MutationId) -> Self {
        Self::json(202, &json!({ "queued": true, "id": id.to_string() }))
    }

    /// Redirect used when an image can be served neither from cache nor
    /// from network.
    pub fn redirect(location: &str) -> Self {
        Self::new(302, Vec::new()).with_header("location", location)
    }

    pub fn to_stored(&self) -> StoredResponse {
        StoredResponse {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
            captured_at: Utc::now(),
        }
    }

    pub fn from_stored(stored: StoredResponse) -> Self {
        Self {
            status: stored.status,
            headers: stored.headers,
            body: stored.body,
        }
    }
}

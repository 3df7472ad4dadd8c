use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A response snapshot as it sits in a cache storage.
///
/// Only GET responses are ever stored; that rule is enforced by the
/// strategies, not here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredResponse {
    /// HTTP status code of the captured response
    pub status: u16,
    /// Response headers, keys lowercased
    pub headers: BTreeMap<String, String>,
    /// Raw response body
    pub body: Vec<u8>,
    /// When the snapshot was captured
    pub captured_at: DateTime<Utc>,
}

impl StoredResponse {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body,
            captured_at: Utc::now(),
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
}

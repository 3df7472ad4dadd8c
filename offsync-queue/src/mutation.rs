use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Identifier of a queued mutation. Uuid v7 so identifiers sort by
/// creation time; durable backends use that for FIFO ordering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct MutationId(Uuid);

impl MutationId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn get(&self) -> Uuid {
        self.0
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for MutationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MutationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A mutation request captured while the network was unavailable.
///
/// Owned exclusively by the queue: nothing else mutates one of these
/// directly. `attempts` only ever grows; the entry is destroyed when a
/// replay succeeds or the user discards it, never because of attempt count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingMutation {
    pub id: MutationId,
    /// Absolute URL the original request targeted
    pub endpoint: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl PendingMutation {
    pub fn new(
        endpoint: impl Into<String>,
        method: impl Into<String>,
        headers: BTreeMap<String, String>,
        body: Option<Vec<u8>>,
    ) -> Self {
        Self {
            id: MutationId::new(),
            endpoint: endpoint.into(),
            method: method.into().to_ascii_uppercase(),
            headers,
            body,
            created_at: Utc::now(),
            attempts: 0,
            last_error: None,
        }
    }

    /// Record one failed replay. Attempts never reset.
    pub fn record_failure(&mut self, err_msg: &str) {
        self.attempts += 1;
        self.last_error = Some(err_msg.to_string());
    }
}

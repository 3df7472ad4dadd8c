//! Control messages sent from the application to the worker. Malformed
//! or unknown messages are ignored, never propagated as errors.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    /// Force immediate takeover before the natural lifecycle point.
    #[serde(rename = "SKIP_ACTIVATION")]
    SkipActivation,
    /// Delete every namespace storage regardless of version.
    #[serde(rename = "CLEAR_ALL_CACHES")]
    ClearAllCaches,
}

impl ControlMessage {
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

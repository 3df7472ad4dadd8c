//! Push payloads and notification interaction. Payload parsing never
//! fails: absent, non-UTF8 or non-JSON input degrades to a default body,
//! and plain text becomes the notification body as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ACTION_OPEN: &str = "open";
pub const ACTION_DISMISS: &str = "dismiss";

const DEFAULT_BODY: &str = "You have new updates";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationAction {
    pub id: String,
    pub label: String,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationData {
    pub date_of_arrival: DateTime<Utc>,
    pub correlation_key: i64,
}

impl Default for NotificationData {
    fn default() -> Self {
        Self {
            date_of_arrival: Utc::now(),
            correlation_key: 1,
        }
    }
}

/// Transient value describing one notification; lives only for the
/// handling of a single push event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPayload {
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibration_pattern: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

impl Default for NotificationPayload {
    fn default() -> Self {
        Self {
            body: DEFAULT_BODY.to_string(),
            icon: "/icons/icon-192x192.png".to_string(),
            badge: "/icons/icon-192x192.png".to_string(),
            vibration_pattern: vec![100, 50, 100],
            data: NotificationData::default(),
            actions: vec![
                NotificationAction {
                    id: ACTION_OPEN.to_string(),
                    label: "Open".to_string(),
                    icon: Some("/icons/checkmark.png".to_string()),
                },
                NotificationAction {
                    id: ACTION_DISMISS.to_string(),
                    label: "Dismiss".to_string(),
                    icon: Some("/icons/xmark.png".to_string()),
                },
            ],
        }
    }
}

impl NotificationPayload {
    /// Tolerant parse of an inbound push payload. Never errors.
    pub fn parse(raw: Option<&[u8]>) -> Self {
        let Some(bytes) = raw else {
            return Self::default();
        };
        let Ok(text) = std::str::from_utf8(bytes) else {
            return Self::default();
        };
        match serde_json::from_str::<Self>(text) {
            Ok(payload) => payload,
            // plain text: use it as the body, keep everything else default
            Err(_) => Self {
                body: text.to_string(),
                ..Self::default()
            },
        }
    }
}

/// A notification the host should display.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub payload: NotificationPayload,
}

/// What the host should do after a notification interaction. The
/// notification itself is always closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickOutcome {
    pub close: bool,
    /// URL to open or focus, if any
    pub navigate: Option<String>,
}

/// An `open` action or a plain body click (no action id) navigates to the
/// application root; `dismiss` and unknown actions do not.
pub fn handle_click(action: Option<&str>) -> ClickOutcome {
    let navigate = match action {
        None | Some(ACTION_OPEN) => Some("/".to_string()),
        Some(ACTION_DISMISS) => None,
        Some(_) => None,
    };
    ClickOutcome {
        close: true,
        navigate,
    }
}

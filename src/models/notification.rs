//! Push payloads and pending notifications.

use serde::{Deserialize, Serialize};

/// The optional JSON body of a push event: `{ title?, body?, url? }`.
///
/// Every field is optional and unknown fields are ignored; a payload
/// that fails to parse at all is treated as `PushPayload::default()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A notification derived from a push event.
///
/// Created on push, consumed on click or dismissal, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNotification {
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
    pub target_url: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================

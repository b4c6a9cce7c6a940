//! Push, notification-click, and background-sync handling.
//!
//! Converts push and periodic-sync platform events into cache writes
//! and user-visible notifications. Push handling never fails on a bad
//! payload; sync failure is surfaced so the platform's own retry and
//! backoff policy reschedules it - the one place retry is fully
//! delegated to the host platform.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::config::SyncConfig;
use crate::error::AgentError;
use crate::host::Host;
use crate::lifecycle::LifecycleController;
use crate::models::{FetchRequest, PendingNotification, PushPayload, RequestKey};
use crate::net::Fetcher;

/// Notification title when the push payload does not carry one.
pub const DEFAULT_NOTIFICATION_TITLE: &str = "New Update";

/// Notification body when the push payload does not carry one.
pub const DEFAULT_NOTIFICATION_BODY: &str = "Check out what's new!";

/// Window target when the clicked notification names no URL.
const DEFAULT_CLICK_TARGET: &str = "/";

pub struct Bridge {
    store: Arc<CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    host: Arc<dyn Host>,
    lifecycle: Arc<LifecycleController>,
    sync: Option<SyncConfig>,
    notification_icon: Option<String>,
}

impl Bridge {
    pub fn new(
        store: Arc<CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        host: Arc<dyn Host>,
        lifecycle: Arc<LifecycleController>,
        sync: Option<SyncConfig>,
        notification_icon: Option<String>,
    ) -> Self {
        Self {
            store,
            fetcher,
            host,
            lifecycle,
            sync,
            notification_icon,
        }
    }

    /// Handle a push event.
    ///
    /// The payload is best-effort JSON; anything unparseable becomes an
    /// all-defaults notification rather than an error. Display is
    /// awaited before returning, since the hosting context may be torn
    /// down once the handler completes.
    pub async fn on_push(&self, payload: Option<&[u8]>) -> Result<(), AgentError> {
        let payload = match payload {
            Some(bytes) => match serde_json::from_slice::<PushPayload>(bytes) {
                Ok(parsed) => parsed,
                Err(e) => {
                    debug!(error = %e, "Unparseable push payload, using defaults");
                    PushPayload::default()
                }
            },
            None => PushPayload::default(),
        };

        let notification = PendingNotification {
            title: payload
                .title
                .unwrap_or_else(|| DEFAULT_NOTIFICATION_TITLE.to_string()),
            body: payload
                .body
                .unwrap_or_else(|| DEFAULT_NOTIFICATION_BODY.to_string()),
            icon: self.notification_icon.clone(),
            target_url: payload.url,
        };

        info!(title = %notification.title, "Displaying push notification");
        self.host
            .show_notification(&notification)
            .await
            .map_err(|e| AgentError::Host(e.to_string()))
    }

    /// Handle a click on a displayed notification: close it, then open
    /// or focus a window at its target URL.
    ///
    /// Always succeeds from the bridge's perspective; focus and window
    /// failures are a platform concern and only logged.
    pub async fn on_notification_click(
        &self,
        notification: &PendingNotification,
    ) -> Result<(), AgentError> {
        if let Err(e) = self.host.close_notification(notification).await {
            debug!(error = %e, "Failed to close notification");
        }

        let target = notification
            .target_url
            .as_deref()
            .unwrap_or(DEFAULT_CLICK_TARGET);
        if let Err(e) = self.host.open_window(target).await {
            warn!(target, error = %e, "Failed to open window");
        }
        Ok(())
    }

    /// Handle a background-sync event.
    ///
    /// Events tagged for our one known sync task fetch the configured
    /// endpoint and store the JSON result under the fixed synthetic key,
    /// so readers of that key always get the latest payload. Any other
    /// tag is ignored. Fetch or parse failure fails the event so the
    /// platform reschedules it.
    pub async fn on_sync(&self, tag: &str) -> Result<(), AgentError> {
        let Some(sync) = &self.sync else {
            debug!(tag, "Sync event but no sync task configured, ignoring");
            return Ok(());
        };
        if tag != sync.tag {
            debug!(tag, known = %sync.tag, "Ignoring sync event for unknown tag");
            return Ok(());
        }

        let request = FetchRequest::subresource(sync.endpoint.clone());
        let snapshot = self
            .fetcher
            .fetch(&request)
            .await
            .map_err(|e| AgentError::SyncFailed(format!("fetch {}: {}", sync.endpoint, e)))?;
        if !snapshot.is_success() {
            return Err(AgentError::SyncFailed(format!(
                "{} returned status {}",
                sync.endpoint, snapshot.status
            )));
        }
        serde_json::from_slice::<serde_json::Value>(&snapshot.body)
            .map_err(|e| AgentError::SyncFailed(format!("invalid JSON from {}: {}", sync.endpoint, e)))?;

        let key = RequestKey::get(sync.cache_key.as_str());
        info!(tag, key = %key, "Storing sync result");
        if let Err(e) = self
            .store
            .put(self.lifecycle.generation(), &key, snapshot)
            .await
        {
            warn!(error = %e, "Failed to persist sync result");
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

//! The platform surface the agent calls back into.
//!
//! Notification display, window focus, and client claiming are owned by
//! the hosting platform, not the agent; this trait is the seam. Tests
//! substitute a recording implementation.

use async_trait::async_trait;
use tracing::debug;

use crate::models::PendingNotification;

#[async_trait]
pub trait Host: Send + Sync {
    /// Display a notification. The push handler awaits this before
    /// completing, since the hosting context may be torn down once the
    /// handler returns.
    async fn show_notification(&self, notification: &PendingNotification) -> anyhow::Result<()>;

    /// Dismiss a displayed notification.
    async fn close_notification(&self, notification: &PendingNotification) -> anyhow::Result<()>;

    /// Open or focus a window at `url`.
    async fn open_window(&self, url: &str) -> anyhow::Result<()>;

    /// Claim routing authority over all open application contexts
    /// without waiting for each to reload.
    async fn claim_clients(&self) -> anyhow::Result<()>;
}

/// Host that accepts everything and does nothing. For embedded use where
/// the surrounding application has no notification or window surface.
#[derive(Debug, Default)]
pub struct NullHost;

#[async_trait]
impl Host for NullHost {
    async fn show_notification(&self, notification: &PendingNotification) -> anyhow::Result<()> {
        debug!(title = %notification.title, "NullHost: dropping notification");
        Ok(())
    }

    async fn close_notification(&self, _notification: &PendingNotification) -> anyhow::Result<()> {
        Ok(())
    }

    async fn open_window(&self, url: &str) -> anyhow::Result<()> {
        debug!(url, "NullHost: ignoring window open");
        Ok(())
    }

    async fn claim_clients(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

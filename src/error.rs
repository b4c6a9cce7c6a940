use thiserror::Error;

use crate::net::FetchError;

#[derive(Error, Debug)]
pub enum AgentError {
    /// A manifest entry could not be fetched; the install attempt is
    /// discarded whole and the platform may retry on its own schedule.
    #[error("install failed: {0}")]
    InstallFailed(String),

    /// Network fetch failed and neither a cached snapshot nor the
    /// offline fallback document applies to this request.
    #[error("request unreachable and no cached fallback")]
    Unreachable(#[source] FetchError),

    /// Sync fetch or parse failed; surfaced so the platform reschedules.
    #[error("sync failed: {0}")]
    SyncFailed(String),

    /// The host platform rejected a notification or window operation.
    #[error("host error: {0}")]
    Host(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

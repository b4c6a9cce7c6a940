//! Per-request routing policy: cache-first, network-first, fallbacks.
//!
//! Navigation requests go network-first so users see fresh documents
//! whenever the network allows; everything else goes cache-first and is
//! served stale without revalidation. Both strategies end at the offline
//! fallback document when the request can accept HTML, and nothing
//! swallows an HTTP error status - only transport failure starts the
//! fallback chain.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::error::AgentError;
use crate::lifecycle::LifecycleController;
use crate::models::{FetchRequest, RequestKey, ResponseSnapshot};
use crate::net::Fetcher;

pub struct Router {
    store: Arc<CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    lifecycle: Arc<LifecycleController>,
    offline_key: RequestKey,
    /// Outstanding write-through tasks. The caller never waits on these
    /// for its response, but `settle` lets the host extend the agent's
    /// lifetime until they finish.
    pending_writes: Mutex<Vec<JoinHandle<()>>>,
}

impl Router {
    pub fn new(
        store: Arc<CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        lifecycle: Arc<LifecycleController>,
        offline_key: RequestKey,
    ) -> Self {
        Self {
            store,
            fetcher,
            lifecycle,
            offline_key,
            pending_writes: Mutex::new(Vec::new()),
        }
    }

    /// Route one intercepted request.
    pub async fn route(&self, request: &FetchRequest) -> Result<ResponseSnapshot, AgentError> {
        if request.is_navigation {
            self.network_first(request).await
        } else {
            self.cache_first(request).await
        }
    }

    /// Navigation strategy: fresh document when possible, cached copy
    /// when not, offline document as the last resort.
    async fn network_first(&self, request: &FetchRequest) -> Result<ResponseSnapshot, AgentError> {
        let tag = self.lifecycle.generation().to_string();

        match self.fetcher.fetch(request).await {
            Ok(snapshot) => {
                self.spawn_write_through(tag, request.key(), snapshot.clone()).await;
                Ok(snapshot)
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "Navigation fetch failed, trying cache");
                if let Some(hit) = self.store.get(&tag, &request.key()).await {
                    return Ok(hit);
                }
                self.offline_fallback(&tag, e).await
            }
        }
    }

    /// Sub-resource strategy: a cached snapshot is returned as-is with
    /// no network call and no revalidation.
    async fn cache_first(&self, request: &FetchRequest) -> Result<ResponseSnapshot, AgentError> {
        let tag = self.lifecycle.generation().to_string();
        let key = request.key();

        if let Some(hit) = self.store.get(&tag, &key).await {
            debug!(key = %key, age_minutes = hit.age_minutes(), "Cache hit");
            return Ok(hit);
        }

        match self.fetcher.fetch(request).await {
            Ok(snapshot) => {
                self.spawn_write_through(tag, key, snapshot.clone()).await;
                Ok(snapshot)
            }
            Err(e) => {
                if request.accepts_html() {
                    debug!(url = %request.url, error = %e, "Fetch failed, serving offline document");
                    self.offline_fallback(&tag, e).await
                } else {
                    // No meaningful fallback for e.g. a binary asset.
                    Err(e.into())
                }
            }
        }
    }

    async fn offline_fallback(
        &self,
        tag: &str,
        cause: crate::net::FetchError,
    ) -> Result<ResponseSnapshot, AgentError> {
        match self.store.get(tag, &self.offline_key).await {
            Some(document) => Ok(document),
            None => Err(AgentError::Unreachable(cause)),
        }
    }

    /// Persist a response copy without making the caller wait.
    ///
    /// The write is attempted in a spawned task; its failure is logged
    /// and never reaches the caller, who already holds the response.
    async fn spawn_write_through(&self, tag: String, key: RequestKey, snapshot: ResponseSnapshot) {
        let store = Arc::clone(&self.store);
        let handle = tokio::spawn(async move {
            if let Err(e) = store.put(&tag, &key, snapshot).await {
                warn!(key = %key, error = %e, "Write-through cache update failed");
            }
        });
        self.pending_writes.lock().await.push(handle);
    }

    /// Await all outstanding write-through tasks. Hosts call this when
    /// asked to keep the agent alive until background work completes.
    pub async fn settle(&self) {
        let handles: Vec<_> = {
            let mut pending = self.pending_writes.lock().await;
            pending.drain(..).collect()
        };
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Write-through task aborted");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

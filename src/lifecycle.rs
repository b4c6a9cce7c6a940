//! Generation lifecycle: install, activate, forced takeover.
//!
//! One controller exists per agent instance and gates which cache
//! generation the router may touch. The state machine is
//! `Installing -> Waiting -> Activating -> Active -> Superseded`;
//! `skip_waiting` fast-forwards the first two states on demand.

use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::host::Host;
use crate::models::FetchRequest;
use crate::net::Fetcher;

/// Maximum concurrent fetches while precaching the install manifest.
/// Bounded to avoid overwhelming the origin during a deployment.
const MAX_CONCURRENT_PRECACHE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Precaching the install manifest.
    Installing,
    /// Installed, waiting for the platform to promote this version.
    Waiting,
    /// Promotion underway (naturally or via skip-waiting).
    Activating,
    /// Controlling routing; exactly one generation remains in storage.
    Active,
    /// Replaced by a newer version.
    Superseded,
}

pub struct LifecycleController {
    tag: String,
    state: RwLock<LifecycleState>,
}

impl LifecycleController {
    pub fn new(tag: String) -> Self {
        Self {
            tag,
            state: RwLock::new(LifecycleState::Installing),
        }
    }

    /// The generation tag this controller manages.
    pub fn generation(&self) -> &str {
        &self.tag
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// Precache every manifest entry into a fresh generation.
    ///
    /// Atomic: all entries are fetched (bounded concurrency) before the
    /// generation is swapped into the store, so a failed attempt leaves
    /// no partial generation behind. Failure is surfaced to the host's
    /// retry policy, never retried here.
    pub async fn install(
        &self,
        config: &AgentConfig,
        fetcher: &dyn Fetcher,
        store: &CacheStore,
    ) -> Result<(), AgentError> {
        info!(tag = %self.tag, entries = config.precache_manifest.len(), "Installing");

        let entries = stream::iter(config.precache_manifest.iter())
            .map(|path| async move {
                let url = config
                    .resolve(path)
                    .map_err(|e| AgentError::InstallFailed(format!("bad manifest path {}: {}", path, e)))?;
                let request = FetchRequest::subresource(url);
                let snapshot = fetcher
                    .fetch(&request)
                    .await
                    .map_err(|e| AgentError::InstallFailed(format!("{}: {}", path, e)))?;
                if !snapshot.is_success() {
                    return Err(AgentError::InstallFailed(format!(
                        "{}: status {}",
                        path, snapshot.status
                    )));
                }
                Ok((request.key(), snapshot))
            })
            .buffer_unordered(MAX_CONCURRENT_PRECACHE)
            .try_collect::<Vec<_>>()
            .await?;

        store
            .install_generation(&self.tag, entries)
            .await
            .map_err(|e| AgentError::InstallFailed(format!("cache write: {:#}", e)))?;

        *self.state.write().await = LifecycleState::Waiting;
        info!(tag = %self.tag, "Install complete");

        if config.skip_waiting_on_install {
            self.skip_waiting().await;
        }
        Ok(())
    }

    /// Promote this generation: garbage-collect every other generation,
    /// then claim routing authority over all open contexts immediately.
    ///
    /// Deletion and claim failures are logged but never block becoming
    /// active - routing with a partially-cleaned store beats no routing.
    pub async fn activate(&self, store: &CacheStore, host: &dyn Host) -> Result<(), AgentError> {
        *self.state.write().await = LifecycleState::Activating;

        for tag in store.list_generations().await {
            if tag != self.tag {
                debug!(stale = %tag, "Deleting superseded generation");
                store.delete_generation(&tag).await;
            }
        }

        *self.state.write().await = LifecycleState::Active;
        info!(tag = %self.tag, "Active");

        if let Err(e) = host.claim_clients().await {
            warn!(error = %e, "Failed to claim clients");
        }
        Ok(())
    }

    /// Fast-forward `Installing`/`Waiting` to `Activating`. Idempotent;
    /// a lost or repeated command changes nothing, and the agent simply
    /// activates at the next natural opportunity instead.
    pub async fn skip_waiting(&self) {
        let mut state = self.state.write().await;
        match *state {
            LifecycleState::Installing | LifecycleState::Waiting => {
                info!(tag = %self.tag, "Skip waiting - forcing activation");
                *state = LifecycleState::Activating;
            }
            LifecycleState::Activating | LifecycleState::Active | LifecycleState::Superseded => {}
        }
    }

    /// Terminal transition, applied when a newer agent version activates.
    pub async fn supersede(&self) {
        *self.state.write().await = LifecycleState::Superseded;
    }
}

// ============================================================================
// Tests
// ============================================================================

//! The agent itself: one event surface over all components.
//!
//! The agent has no main loop. The host registers it once and then
//! invokes `dispatch` (or an individual `on_*` handler) per platform
//! event; handlers for distinct events may overlap freely. The only
//! shared mutable state between them is the cache store.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::bridge::Bridge;
use crate::cache::CacheStore;
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::host::Host;
use crate::lifecycle::{LifecycleController, LifecycleState};
use crate::models::{FetchRequest, PendingNotification, RequestKey, ResponseSnapshot};
use crate::net::{Fetcher, HttpFetcher};
use crate::router::Router;

/// The one inbound control-channel command: fast-forward lifecycle
/// progression without waiting for open clients to close.
const SKIP_WAITING: &str = "SKIP_WAITING";

/// A platform event, as delivered to `Agent::dispatch`.
///
/// One variant per handler the agent registers; the host owns the
/// actual event loop and translation from its native event types.
#[derive(Debug)]
pub enum PlatformEvent {
    Install,
    Activate,
    Fetch(FetchRequest),
    /// Push event with its raw (possibly absent, possibly malformed)
    /// payload bytes.
    Push(Option<Vec<u8>>),
    NotificationClick(PendingNotification),
    /// Background sync event carrying its task tag.
    Sync(String),
    /// Cross-context control message.
    Message(serde_json::Value),
}

/// What a dispatched event produced.
#[derive(Debug)]
pub enum EventOutcome {
    Handled,
    Response(ResponseSnapshot),
}

#[derive(Debug, Deserialize)]
struct ControlMessage {
    #[serde(rename = "type")]
    kind: String,
}

pub struct Agent {
    config: AgentConfig,
    store: Arc<CacheStore>,
    lifecycle: Arc<LifecycleController>,
    router: Router,
    bridge: Bridge,
    fetcher: Arc<dyn Fetcher>,
    host: Arc<dyn Host>,
}

impl Agent {
    pub fn new(
        config: AgentConfig,
        fetcher: Arc<dyn Fetcher>,
        host: Arc<dyn Host>,
    ) -> anyhow::Result<Self> {
        config.validate()?;

        let store = Arc::new(CacheStore::open(config.cache_dir.clone())?);
        let lifecycle = Arc::new(LifecycleController::new(config.generation_tag()));
        let offline_key = RequestKey::get(config.offline_url()?.as_str());

        let router = Router::new(
            Arc::clone(&store),
            Arc::clone(&fetcher),
            Arc::clone(&lifecycle),
            offline_key,
        );
        let bridge = Bridge::new(
            Arc::clone(&store),
            Arc::clone(&fetcher),
            Arc::clone(&host),
            Arc::clone(&lifecycle),
            config.sync.clone(),
            config.notification_icon.clone(),
        );

        Ok(Self {
            config,
            store,
            lifecycle,
            router,
            bridge,
            fetcher,
            host,
        })
    }

    /// Agent backed by the real HTTP fetcher.
    pub fn with_http(config: AgentConfig, host: Arc<dyn Host>) -> anyhow::Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new()?);
        Self::new(config, fetcher, host)
    }

    /// Route a platform event to its handler.
    pub async fn dispatch(&self, event: PlatformEvent) -> Result<EventOutcome, AgentError> {
        match event {
            PlatformEvent::Install => self.on_install().await.map(|_| EventOutcome::Handled),
            PlatformEvent::Activate => self.on_activate().await.map(|_| EventOutcome::Handled),
            PlatformEvent::Fetch(request) => {
                self.on_fetch(&request).await.map(EventOutcome::Response)
            }
            PlatformEvent::Push(payload) => self
                .on_push(payload.as_deref())
                .await
                .map(|_| EventOutcome::Handled),
            PlatformEvent::NotificationClick(notification) => self
                .on_notification_click(&notification)
                .await
                .map(|_| EventOutcome::Handled),
            PlatformEvent::Sync(tag) => self.on_sync(&tag).await.map(|_| EventOutcome::Handled),
            PlatformEvent::Message(message) => {
                self.on_message(&message).await;
                Ok(EventOutcome::Handled)
            }
        }
    }

    pub async fn on_install(&self) -> Result<(), AgentError> {
        self.lifecycle
            .install(&self.config, self.fetcher.as_ref(), &self.store)
            .await
    }

    pub async fn on_activate(&self) -> Result<(), AgentError> {
        self.lifecycle.activate(&self.store, self.host.as_ref()).await
    }

    pub async fn on_fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot, AgentError> {
        self.router.route(request).await
    }

    pub async fn on_push(&self, payload: Option<&[u8]>) -> Result<(), AgentError> {
        self.bridge.on_push(payload).await
    }

    pub async fn on_notification_click(
        &self,
        notification: &PendingNotification,
    ) -> Result<(), AgentError> {
        self.bridge.on_notification_click(notification).await
    }

    pub async fn on_sync(&self, tag: &str) -> Result<(), AgentError> {
        self.bridge.on_sync(tag).await
    }

    /// Handle an inbound control message. One-way: unknown or malformed
    /// messages are ignored, nothing is acknowledged.
    pub async fn on_message(&self, message: &serde_json::Value) {
        match serde_json::from_value::<ControlMessage>(message.clone()) {
            Ok(msg) if msg.kind == SKIP_WAITING => self.lifecycle.skip_waiting().await,
            Ok(msg) => debug!(kind = %msg.kind, "Ignoring unknown control message"),
            Err(_) => debug!("Ignoring malformed control message"),
        }
    }

    /// Await outstanding write-through work (the host's keep-alive
    /// contract for fire-and-forget cache writes).
    pub async fn settle(&self) {
        self.router.settle().await;
    }

    pub async fn state(&self) -> LifecycleState {
        self.lifecycle.state().await
    }

    pub fn generation_tag(&self) -> String {
        self.config.generation_tag()
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }
}

// ============================================================================
// Tests
// ============================================================================

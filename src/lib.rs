//! offcache - an offline-resilience agent.
//!
//! A reactive component that sits between a host application and the
//! network: it keeps a versioned local cache of responses (one named
//! generation per deployment), decides per request whether to serve
//! from cache or network, garbage-collects stale generations at
//! activation, and bridges push, background-sync, and cross-context
//! control messages into cache writes and notifications.
//!
//! The agent has no main loop. The host translates its platform's
//! events into [`PlatformEvent`] values and feeds them to
//! [`Agent::dispatch`]; handlers for distinct events may be in flight
//! concurrently.
//!
//! ```no_run
//! use std::sync::Arc;
//! use offcache::{Agent, AgentConfig, NullHost, PlatformEvent};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = AgentConfig::from_file(std::path::Path::new("agent.json"))?;
//! let agent = Agent::with_http(config, Arc::new(NullHost))?;
//!
//! agent.dispatch(PlatformEvent::Install).await?;
//! agent.dispatch(PlatformEvent::Activate).await?;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod bridge;
pub mod cache;
pub mod config;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod models;
pub mod net;
pub mod router;

#[cfg(test)]
pub(crate) mod testutil;

pub use agent::{Agent, EventOutcome, PlatformEvent};
pub use cache::CacheStore;
pub use config::{AgentConfig, SyncConfig};
pub use error::AgentError;
pub use host::{Host, NullHost};
pub use lifecycle::{LifecycleController, LifecycleState};
pub use models::{FetchRequest, PendingNotification, PushPayload, RequestKey, ResponseSnapshot};
pub use net::{FetchError, Fetcher, HttpFetcher};
pub use router::Router;

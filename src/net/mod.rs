//! Network access for the offline agent.
//!
//! This module provides the `Fetcher` trait the router and lifecycle
//! controller fetch through, and `HttpFetcher`, the reqwest-backed
//! implementation used in production. Tests substitute their own
//! `Fetcher` to script successes, failures, and call counts.

pub mod client;
pub mod error;

use async_trait::async_trait;

use crate::models::{FetchRequest, ResponseSnapshot};

pub use client::HttpFetcher;
pub use error::FetchError;

/// The agent's one seam to the network.
///
/// An `Err` means transport failure (unreachable, DNS, timeout). An HTTP
/// error status is a *successful* fetch and comes back as a snapshot;
/// only transport failure triggers the router's fallback chain.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot, FetchError>;
}

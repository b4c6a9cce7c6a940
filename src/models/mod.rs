//! Core data types for the offline agent.
//!
//! This module provides:
//! - `RequestKey`: the (method, URL) request identity used as a cache key
//! - `FetchRequest`: an intercepted request with its routing metadata
//! - `ResponseSnapshot`: a stored, replayable copy of a response
//! - `PushPayload` and `PendingNotification`: push-event data

pub mod notification;
pub mod request;
pub mod response;

pub use notification::{PendingNotification, PushPayload};
pub use request::{FetchRequest, RequestKey};
pub use response::ResponseSnapshot;

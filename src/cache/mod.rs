//! Versioned local cache of request/response pairs.
//!
//! This module provides the `CacheStore`, a set of named cache
//! generations (one per deployment) mapping request identities to
//! response snapshots. Generations are persisted as one JSON file each
//! under the cache directory and reloaded when the store is reopened,
//! or kept purely in memory when no directory is configured.
//!
//! A cache miss is a normal outcome (`None`), never an error.

pub mod store;

pub use store::CacheStore;

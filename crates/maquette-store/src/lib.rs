#![forbid(unsafe_code)]

//! Durable model cache store.
//!
//! Owns the on-disk cache of 3D-asset bytes. Entries are keyed by request
//! URL and carry the full response (status, headers, body) plus an injected
//! `cached-time` timestamp header. An entry past the expiry window is stale
//! and must be refetched, not served; staleness is computed lazily on read.
//!
//! The only eviction beyond per-entry expiry is the versioned-namespace
//! cleanup performed when the store is opened.

mod atomic_write;
mod entry;
mod error;
mod hash;
mod options;
mod store;

pub use crate::{
    entry::{Freshness, StoredEntry, CACHED_TIME_HEADER},
    error::{StoreError, StoreResult},
    hash::EntryHash,
    options::{StoreOptions, DEFAULT_EXPIRY},
    store::ModelStore,
};

/// Current wall clock, in milliseconds since the Unix epoch.
///
/// The `cached-time` header stores this value as a string.
#[must_use]
pub fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

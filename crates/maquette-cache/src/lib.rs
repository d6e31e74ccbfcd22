#![forbid(unsafe_code)]

//! Cache worker.
//!
//! A background task that owns the durable model cache and answers three
//! kinds of requests over a command channel, one reply channel per call:
//!
//! - `Fetch` — the interception path: serve a fresh cached copy, otherwise
//!   fetch, stamp, store, and return the original response. Callers always
//!   receive a response; transport failures become a synthetic HTTP 408.
//! - `PreloadModel` — warm the cache for a URL ahead of navigation.
//! - `CacheStatus` — enumerate cached URLs.
//!
//! Commands are handled to completion one at a time on the worker's own
//! task; that serialization is the entire locking story for the store.

mod error;
mod msg;
mod service;

pub use crate::{
    error::{CacheError, CacheResult},
    msg::{CacheCommand, CacheStatusReport, ModelResponse, PreloadComplete, ResponseOrigin},
    service::{CacheConfig, CacheHandle, CacheService},
};

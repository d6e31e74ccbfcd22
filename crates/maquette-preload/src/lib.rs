#![forbid(unsafe_code)]

//! Preload coordinator.
//!
//! Decides *whether*, *what*, and *in what order* to fetch in the
//! background, without degrading the experience of the page the user is
//! actually on. Holds the dual queues (priority drains before regular),
//! classifies network quality, gates dispatch on page visibility and the
//! landing context, and talks to the cache worker one item at a time.
//!
//! Everything here is best-effort: initialization failures and worker
//! errors downgrade the session to "no background caching" instead of
//! surfacing to callers.

mod config;
mod coordinator;
mod events;
mod network;
mod state;

pub use crate::{
    config::{
        PreloadConfig, DEFAULT_ITEM_TIMEOUT, DEFAULT_PROBE_TIMEOUT, SLOW_NETWORK_QUEUE_CAP,
        SLOW_NETWORK_SIZE_LIMIT_MB,
    },
    coordinator::Preloader,
    events::{DisabledReason, PageEvent, PreloadEvent},
    network::{evaluate_hint, probe_latency, ConnectionHint, EffectiveType, HintDecision, NetworkClass},
    state::{PreloadPhase, PreloadState, PreloadStatus, QueueEntry},
};

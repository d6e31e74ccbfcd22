use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{events::PreloadEvent, network::ConnectionHint};

/// Latency probe budget. A probe still in flight past this is a slow network.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Bounded wait per preload attempt. On expiry the item is abandoned (the
/// worker's fetch keeps running) and the loop moves on.
pub const DEFAULT_ITEM_TIMEOUT: Duration = Duration::from_secs(10);

/// On a slow network only assets below this size are queued.
pub const SLOW_NETWORK_SIZE_LIMIT_MB: f32 = 5.0;

/// On a slow network at most this many assets are queued.
pub const SLOW_NETWORK_QUEUE_CAP: usize = 3;

/// Configuration for the preload coordinator.
#[derive(Clone, Debug)]
pub struct PreloadConfig {
    /// Site root; asset paths from the manifest resolve against it.
    pub site_root: Url,
    /// Page path at construction time. A viewer path disables the session.
    pub initial_path: String,
    /// Platform connection signal, if any.
    pub connection_hint: ConnectionHint,
    /// Small resource fetched for the latency probe, relative to the site
    /// root. `None` skips the probe.
    pub probe_path: Option<String>,
    pub probe_timeout: Duration,
    pub item_timeout: Duration,
    /// Capacity of the command channel.
    pub command_channel_capacity: usize,
    /// Capacity of the events broadcast channel (used when `events_tx` is
    /// not provided).
    pub events_channel_capacity: usize,
    /// Events broadcast sender (optional - if not provided, one is created
    /// internally).
    pub events_tx: Option<broadcast::Sender<PreloadEvent>>,
    /// Cancellation token for graceful shutdown.
    pub cancel: Option<CancellationToken>,
}

impl PreloadConfig {
    pub fn new(site_root: Url) -> Self {
        Self {
            site_root,
            initial_path: "/".to_string(),
            connection_hint: ConnectionHint::default(),
            probe_path: Some("thumbnail.png".to_string()),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            item_timeout: DEFAULT_ITEM_TIMEOUT,
            command_channel_capacity: 32,
            events_channel_capacity: 32,
            events_tx: None,
            cancel: None,
        }
    }

    #[must_use]
    pub fn with_initial_path(mut self, path: impl Into<String>) -> Self {
        self.initial_path = path.into();
        self
    }

    #[must_use]
    pub fn with_connection_hint(mut self, hint: ConnectionHint) -> Self {
        self.connection_hint = hint;
        self
    }

    #[must_use]
    pub fn with_probe_path(mut self, path: Option<String>) -> Self {
        self.probe_path = path;
        self
    }

    #[must_use]
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_item_timeout(mut self, timeout: Duration) -> Self {
        self.item_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_command_channel_capacity(mut self, capacity: usize) -> Self {
        self.command_channel_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn with_events_channel_capacity(mut self, capacity: usize) -> Self {
        self.events_channel_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn with_events(mut self, events_tx: broadcast::Sender<PreloadEvent>) -> Self {
        self.events_tx = Some(events_tx);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

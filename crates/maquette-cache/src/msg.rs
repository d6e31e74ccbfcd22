use bytes::Bytes;
use maquette_net::{Headers, HttpResponse};
use maquette_store::StoredEntry;
use tokio::sync::oneshot;
use url::Url;

/// Where a [`ModelResponse`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseOrigin {
    /// Served from the durable cache without touching the network.
    Cache,
    /// Fetched from the network (cached or not).
    Network,
    /// Fabricated by the worker after a transport failure.
    Synthetic,
}

/// Response handed back on the interception path.
#[derive(Clone, Debug)]
pub struct ModelResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: Bytes,
    pub origin: ResponseOrigin,
}

impl ModelResponse {
    /// The failure response returned in place of a transport error.
    #[must_use]
    pub fn synthetic_timeout() -> Self {
        Self {
            status: 408,
            status_text: "Request Timeout".to_string(),
            headers: Headers::new(),
            body: Bytes::from_static(b"Network error"),
            origin: ResponseOrigin::Synthetic,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    pub(crate) fn from_http(resp: HttpResponse, origin: ResponseOrigin) -> Self {
        Self {
            status: resp.status,
            status_text: resp.status_text,
            headers: resp.headers,
            body: resp.body,
            origin,
        }
    }

    pub(crate) fn from_entry(entry: StoredEntry) -> Self {
        Self {
            status: entry.status,
            status_text: entry.status_text,
            headers: entry.headers,
            body: entry.body,
            origin: ResponseOrigin::Cache,
        }
    }
}

/// Reply to a `PreloadModel` command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreloadComplete {
    pub url: Url,
    pub success: bool,
    /// The entry was already present; no network fetch happened.
    pub cached: bool,
    pub error: Option<String>,
}

/// Reply to a `CacheStatus` command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheStatusReport {
    pub cached_models: Vec<Url>,
    pub total_models: usize,
}

/// Commands accepted by the cache worker. Every command carries its own
/// reply channel; a dropped receiver is ignored, never an error.
#[derive(Debug)]
pub enum CacheCommand {
    Fetch {
        url: Url,
        reply: oneshot::Sender<ModelResponse>,
    },
    PreloadModel {
        url: Url,
        reply: oneshot::Sender<PreloadComplete>,
    },
    CacheStatus {
        reply: oneshot::Sender<CacheStatusReport>,
    },
}

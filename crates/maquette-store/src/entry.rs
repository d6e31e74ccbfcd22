use std::time::Duration;

use bytes::Bytes;
use maquette_net::Headers;
use serde::{Deserialize, Serialize};
use url::Url;

/// Header injected into every stored response: milliseconds since the Unix
/// epoch, as a string. Absence on a retrieved entry means "treat as stale".
pub const CACHED_TIME_HEADER: &str = "cached-time";

/// Freshness of a cache entry relative to the expiry window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
}

/// A cached response read back from the store.
#[derive(Clone, Debug)]
pub struct StoredEntry {
    pub url: Url,
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: Bytes,
}

impl StoredEntry {
    /// Stamp time recorded at store time, if present and well-formed.
    #[must_use]
    pub fn cached_at_ms(&self) -> Option<u64> {
        self.headers.get(CACHED_TIME_HEADER)?.parse().ok()
    }

    /// Lazy freshness check: entries age out purely by time elapsing, there
    /// is no background sweep. A missing or garbled stamp is stale.
    #[must_use]
    pub fn freshness(&self, now_ms: u64, expiry: Duration) -> Freshness {
        let expiry_ms = u64::try_from(expiry.as_millis()).unwrap_or(u64::MAX);
        match self.cached_at_ms() {
            Some(stamped) if now_ms.saturating_sub(stamped) < expiry_ms => Freshness::Fresh,
            _ => Freshness::Stale,
        }
    }
}

/// On-disk metadata sidecar. The body lives in a separate `.bin` file; the
/// metadata file is written last and acts as the commit marker.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StoredMeta {
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
}

impl StoredMeta {
    pub(crate) fn from_parts(url: &Url, status: u16, status_text: &str, headers: &Headers) -> Self {
        Self {
            url: url.to_string(),
            status,
            status_text: status_text.to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub(crate) fn into_entry(self, body: Bytes) -> Option<StoredEntry> {
        let url = Url::parse(&self.url).ok()?;
        Some(StoredEntry {
            url,
            status: self.status,
            status_text: self.status_text,
            headers: self.headers.into_iter().collect(),
            body,
        })
    }
}

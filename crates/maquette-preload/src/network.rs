use std::time::Duration;

use maquette_net::Net;
use tracing::{debug, warn};
use url::Url;

/// Coarse network quality classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkClass {
    Slow,
    Normal,
    Unknown,
}

/// Connection type as reported by the platform, when available.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EffectiveType {
    Slow2g,
    TwoG,
    ThreeG,
    FourG,
    #[default]
    Unknown,
}

/// Platform-supplied connection signal. The coordinator never measures
/// this itself; it is handed in at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ConnectionHint {
    pub effective_type: EffectiveType,
    pub save_data: bool,
}

/// Outcome of evaluating the connection hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HintDecision {
    /// Conditions rule out preloading for the whole session.
    Disable,
    Class(NetworkClass),
}

/// Session-level decision from the connection hint alone.
#[must_use]
pub fn evaluate_hint(hint: ConnectionHint) -> HintDecision {
    if hint.save_data {
        debug!("maquette-preload: data saver enabled, preloading ruled out");
        return HintDecision::Disable;
    }
    match hint.effective_type {
        EffectiveType::Slow2g | EffectiveType::TwoG => HintDecision::Disable,
        EffectiveType::ThreeG => HintDecision::Class(NetworkClass::Slow),
        EffectiveType::FourG => HintDecision::Class(NetworkClass::Normal),
        EffectiveType::Unknown => HintDecision::Class(NetworkClass::Unknown),
    }
}

/// Latency probe: fetch a small known resource and compare against the
/// threshold.
///
/// Returns `Some(NetworkClass::Slow)` when the probe is still in flight
/// past the threshold; `None` when it finished in time or failed outright
/// (a failed probe carries no signal and leaves the prior class untouched).
pub async fn probe_latency<N: Net + ?Sized>(
    net: &N,
    url: Url,
    threshold: Duration,
) -> Option<NetworkClass> {
    match tokio::time::timeout(threshold, net.get_bytes(url.clone(), None)).await {
        Ok(Ok(_)) => {
            debug!(url = %url, "maquette-preload: latency probe within threshold");
            None
        }
        Ok(Err(e)) => {
            warn!(url = %url, error = %e, "maquette-preload: latency probe failed");
            None
        }
        Err(_) => {
            debug!(url = %url, threshold_ms = threshold.as_millis() as u64, "maquette-preload: latency probe exceeded threshold");
            Some(NetworkClass::Slow)
        }
    }
}

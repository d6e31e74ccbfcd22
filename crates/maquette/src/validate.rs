use maquette_manifest::ModelManifest;
use maquette_net::Net;
use tracing::{debug, warn};
use url::Url;

/// A registry entry whose asset could not be confirmed reachable.
#[derive(Clone, Debug)]
pub struct MissingAsset {
    pub key: String,
    pub url: Option<Url>,
    pub reason: String,
}

/// Probe every registry entry with a HEAD request and report the ones that
/// do not answer.
///
/// Purely advisory: deployments run this to catch renamed or dropped model
/// files. Probes go one at a time, like everything else in this subsystem.
pub async fn validate_manifest<N: Net + ?Sized>(
    net: &N,
    site_root: &Url,
    manifest: &ModelManifest,
) -> Vec<MissingAsset> {
    let mut missing = Vec::new();

    for descriptor in manifest.descriptors() {
        match manifest.asset_url(site_root, &descriptor.key) {
            Ok(url) => {
                if let Err(e) = net.head(url.clone(), None).await {
                    missing.push(MissingAsset {
                        key: descriptor.key.clone(),
                        url: Some(url),
                        reason: e.to_string(),
                    });
                }
            }
            Err(e) => missing.push(MissingAsset {
                key: descriptor.key.clone(),
                url: None,
                reason: e.to_string(),
            }),
        }
    }

    if missing.is_empty() {
        debug!(total = manifest.len(), "maquette: all manifest assets reachable");
    } else {
        warn!(
            missing = missing.len(),
            total = manifest.len(),
            "maquette: manifest validation found unreachable assets"
        );
    }

    missing
}

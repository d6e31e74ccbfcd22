use std::{path::PathBuf, sync::Arc, time::Duration};

use maquette_cache::{CacheConfig, CacheHandle, CacheService};
use maquette_manifest::ModelManifest;
use maquette_net::{HttpClient, Net, NetOptions};
use maquette_preload::{ConnectionHint, PreloadConfig, Preloader};
use maquette_store::{ModelStore, StoreOptions};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// One config for the whole subsystem.
#[derive(Clone, Debug)]
pub struct SystemConfig {
    /// Site root; asset paths and the probe resolve against it, and only
    /// same-origin responses are cached.
    pub site_root: Url,
    pub store: StoreOptions,
    pub net: NetOptions,
    pub manifest: Arc<ModelManifest>,
    /// Page path at startup; a viewer path disables background preloading.
    pub initial_path: String,
    pub connection_hint: ConnectionHint,
    /// Latency probe resource, relative to the site root. `None` skips it.
    pub probe_path: Option<String>,
    pub probe_timeout: Duration,
    pub item_timeout: Duration,
    pub cancel: Option<CancellationToken>,
}

impl SystemConfig {
    pub fn new(site_root: Url, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            site_root,
            store: StoreOptions::new(cache_dir),
            net: NetOptions::default(),
            manifest: Arc::new(ModelManifest::default_registry()),
            initial_path: "/".to_string(),
            connection_hint: ConnectionHint::default(),
            probe_path: Some("thumbnail.png".to_string()),
            probe_timeout: maquette_preload::DEFAULT_PROBE_TIMEOUT,
            item_timeout: maquette_preload::DEFAULT_ITEM_TIMEOUT,
            cancel: None,
        }
    }

    #[must_use]
    pub fn with_store(mut self, store: StoreOptions) -> Self {
        self.store = store;
        self
    }

    #[must_use]
    pub fn with_net(mut self, net: NetOptions) -> Self {
        self.net = net;
        self
    }

    #[must_use]
    pub fn with_manifest(mut self, manifest: Arc<ModelManifest>) -> Self {
        self.manifest = manifest;
        self
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
    pub fn with_item_timeout(mut self, timeout: Duration) -> Self {
        self.item_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// The wired subsystem: cache worker plus preload coordinator.
///
/// Construction never fails: a store or worker problem degrades the session
/// to "no background caching", observable only through
/// [`Preloader::status`]. The subsystem is invisible when it fails.
pub struct PreloadSystem {
    preloader: Preloader,
    cache: Option<CacheHandle>,
    cancel: CancellationToken,
    worker_task: Option<JoinHandle<()>>,
}

impl PreloadSystem {
    /// Start with the default HTTP client.
    #[must_use]
    pub fn start(config: SystemConfig) -> Self {
        let client = HttpClient::new(config.net.clone());
        Self::start_with_net(config, client)
    }

    /// Start with a caller-supplied network implementation.
    pub fn start_with_net<N: Net + Clone + 'static>(config: SystemConfig, net: N) -> Self {
        let cancel = config.cancel.clone().unwrap_or_default();

        let worker = match ModelStore::open(config.store.clone()) {
            Ok(store) => {
                let (handle, task) = CacheService::spawn(
                    CacheConfig::new(config.site_root.clone()),
                    store,
                    net.clone(),
                    config.manifest.clone(),
                    cancel.child_token(),
                );
                debug!("maquette: cache worker registered");
                Some((handle, task))
            }
            Err(e) => {
                warn!(error = %e, "maquette: cache store unavailable, no background caching");
                None
            }
        };
        let (cache, worker_task) = match worker {
            Some((handle, task)) => (Some(handle), Some(task)),
            None => (None, None),
        };

        let preload_config = PreloadConfig::new(config.site_root)
            .with_initial_path(config.initial_path)
            .with_connection_hint(config.connection_hint)
            .with_probe_path(config.probe_path)
            .with_probe_timeout(config.probe_timeout)
            .with_item_timeout(config.item_timeout)
            .with_cancel(cancel.child_token());
        let preloader = Preloader::spawn(preload_config, config.manifest, cache.clone(), net);

        Self {
            preloader,
            cache,
            cancel,
            worker_task,
        }
    }

    pub fn preloader(&self) -> &Preloader {
        &self.preloader
    }

    /// Handle to the cache worker, when registration succeeded. Viewer glue
    /// routes model requests through [`CacheHandle::fetch`].
    pub fn cache(&self) -> Option<&CacheHandle> {
        self.cache.as_ref()
    }

    /// Stop both components. In-flight fetches are not interrupted.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.preloader.shutdown().await;
        if let Some(task) = self.worker_task {
            let _ = task.await;
        }
    }
}

use std::sync::Arc;

use maquette_manifest::ModelManifest;
use maquette_net::Net;
use maquette_store::{now_ms, Freshness, ModelStore};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use url::Url;

use crate::{
    error::{CacheError, CacheResult},
    msg::{CacheCommand, CacheStatusReport, ModelResponse, PreloadComplete, ResponseOrigin},
};

#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Origin used for the "basic response" rule: only same-origin 200
    /// responses are cached.
    pub site_root: Url,
    /// Capacity of the command channel.
    pub command_channel_capacity: usize,
}

impl CacheConfig {
    pub fn new(site_root: Url) -> Self {
        Self {
            site_root,
            command_channel_capacity: 16,
        }
    }

    #[must_use]
    pub fn with_command_channel_capacity(mut self, capacity: usize) -> Self {
        self.command_channel_capacity = capacity.max(1);
        self
    }
}

/// Cloneable client side of the worker. One reply channel per call.
#[derive(Clone, Debug)]
pub struct CacheHandle {
    cmd_tx: mpsc::Sender<CacheCommand>,
}

impl CacheHandle {
    /// Interception path: resolve a request through the cache.
    ///
    /// # Errors
    ///
    /// Only [`CacheError::WorkerGone`]; the worker itself never fails a
    /// fetch, it answers with a synthetic 408 instead.
    pub async fn fetch(&self, url: Url) -> CacheResult<ModelResponse> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(CacheCommand::Fetch { url, reply })
            .await
            .map_err(|_| CacheError::WorkerGone)?;
        rx.await.map_err(|_| CacheError::WorkerGone)
    }

    /// Warm the cache for a URL.
    pub async fn preload(&self, url: Url) -> CacheResult<PreloadComplete> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(CacheCommand::PreloadModel { url, reply })
            .await
            .map_err(|_| CacheError::WorkerGone)?;
        rx.await.map_err(|_| CacheError::WorkerGone)
    }

    /// Enumerate cached URLs.
    pub async fn status(&self) -> CacheResult<CacheStatusReport> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(CacheCommand::CacheStatus { reply })
            .await
            .map_err(|_| CacheError::WorkerGone)?;
        rx.await.map_err(|_| CacheError::WorkerGone)
    }
}

/// The worker task. Owns the store exclusively; nothing else writes to it.
pub struct CacheService<N> {
    store: ModelStore,
    net: N,
    manifest: Arc<ModelManifest>,
    site_root: Url,
    cmd_rx: mpsc::Receiver<CacheCommand>,
    cancel: CancellationToken,
}

impl<N: Net + 'static> CacheService<N> {
    /// Spawn the worker and return its handle.
    pub fn spawn(
        config: CacheConfig,
        store: ModelStore,
        net: N,
        manifest: Arc<ModelManifest>,
        cancel: CancellationToken,
    ) -> (CacheHandle, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(config.command_channel_capacity);
        let service = Self {
            store,
            net,
            manifest,
            site_root: config.site_root,
            cmd_rx,
            cancel,
        };
        let task = tokio::spawn(service.run());
        (CacheHandle { cmd_tx }, task)
    }

    async fn run(mut self) {
        debug!("maquette-cache: worker started");

        loop {
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => break,

                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => break, // All handles dropped
                    }
                }
            }
        }

        debug!("maquette-cache: worker stopped");
    }

    async fn handle_command(&self, cmd: CacheCommand) {
        // A dropped reply receiver means the caller stopped waiting; the
        // work is already done and the cache stays warm for next time.
        match cmd {
            CacheCommand::Fetch { url, reply } => {
                let resp = self.handle_fetch(url).await;
                let _ = reply.send(resp);
            }
            CacheCommand::PreloadModel { url, reply } => {
                let complete = self.handle_preload(url).await;
                let _ = reply.send(complete);
            }
            CacheCommand::CacheStatus { reply } => {
                let _ = reply.send(self.handle_status());
            }
        }
    }

    fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.site_root.origin()
    }

    fn cached_entry(&self, url: &Url) -> Option<maquette_store::StoredEntry> {
        match self.store.get(url) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(url = %url, error = %e, "maquette-cache: cache read failed, treating as miss");
                None
            }
        }
    }

    fn store_response(&self, url: &Url, resp: &maquette_net::HttpResponse) {
        if let Err(e) = self
            .store
            .put(url, resp.status, &resp.status_text, &resp.headers, &resp.body)
        {
            warn!(url = %url, error = %e, "maquette-cache: cache write failed, serving network bytes");
        } else {
            debug!(url = %url, bytes = resp.body.len(), "maquette-cache: cached");
        }
    }

    async fn handle_fetch(&self, url: Url) -> ModelResponse {
        if !maquette_manifest::is_model_path(url.path()) {
            // Unrecognized file type: plain passthrough, never cached.
            return match self.net.get(url.clone(), None).await {
                Ok(resp) => ModelResponse::from_http(resp, ResponseOrigin::Network),
                Err(e) => {
                    warn!(url = %url, error = %e, "maquette-cache: passthrough fetch failed");
                    ModelResponse::synthetic_timeout()
                }
            };
        }

        if let Some(entry) = self.cached_entry(&url) {
            if entry.freshness(now_ms(), self.store.expiry()) == Freshness::Fresh {
                debug!(url = %url, "maquette-cache: serving from cache");
                return ModelResponse::from_entry(entry);
            }
            trace!(url = %url, "maquette-cache: entry stale, refetching");
        }

        debug!(url = %url, "maquette-cache: fetching from network");
        match self.net.get(url.clone(), None).await {
            Ok(resp) => {
                if resp.status == 200 && self.is_same_origin(&url) {
                    // Store a stamped copy; the caller gets the original,
                    // unstamped response.
                    self.store_response(&url, &resp);
                } else {
                    warn!(
                        url = %url,
                        status = resp.status,
                        same_origin = self.is_same_origin(&url),
                        "maquette-cache: response not cacheable"
                    );
                }
                ModelResponse::from_http(resp, ResponseOrigin::Network)
            }
            Err(e) => {
                warn!(url = %url, error = %e, "maquette-cache: network fetch failed");
                ModelResponse::synthetic_timeout()
            }
        }
    }

    async fn handle_preload(&self, url: Url) -> PreloadComplete {
        // Presence alone counts here, stale or not: the interception path
        // handles refresh on actual use.
        if self.store.contains(&url) {
            trace!(url = %url, "maquette-cache: preload hit, already cached");
            return PreloadComplete {
                url,
                success: true,
                cached: true,
                error: None,
            };
        }

        debug!(url = %url, "maquette-cache: preloading");
        match self.net.get(url.clone(), None).await {
            Ok(resp) if resp.status == 200 && self.is_same_origin(&url) => {
                match self
                    .store
                    .put(&url, resp.status, &resp.status_text, &resp.headers, &resp.body)
                {
                    Ok(()) => {
                        debug!(url = %url, bytes = resp.body.len(), "maquette-cache: preloaded and cached");
                        PreloadComplete {
                            url,
                            success: true,
                            cached: false,
                            error: None,
                        }
                    }
                    Err(e) => PreloadComplete {
                        url,
                        success: false,
                        cached: false,
                        error: Some(e.to_string()),
                    },
                }
            }
            Ok(resp) => PreloadComplete {
                url,
                success: false,
                cached: false,
                error: Some(format!("HTTP {} {}", resp.status, resp.status_text)),
            },
            Err(e) => {
                warn!(url = %url, error = %e, "maquette-cache: preload failed");
                PreloadComplete {
                    url,
                    success: false,
                    cached: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn handle_status(&self) -> CacheStatusReport {
        let cached_models = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "maquette-cache: key enumeration failed");
                Vec::new()
            }
        };
        CacheStatusReport {
            cached_models,
            total_models: self.manifest.len(),
        }
    }
}

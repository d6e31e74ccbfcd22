use std::collections::HashMap;
use std::sync::Arc;

use maquette_cache::CacheHandle;
use maquette_manifest::ModelManifest;
use maquette_net::Net;
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use url::Url;

use crate::{
    config::PreloadConfig,
    events::{DisabledReason, PageEvent, PreloadEvent},
    network::{evaluate_hint, probe_latency, HintDecision},
    state::{PreloadPhase, PreloadState, PreloadStatus, QueueEntry},
};

#[derive(Debug)]
enum Command {
    Page(PageEvent),
    Prioritize {
        key: String,
        high_priority: bool,
    },
    LoadCurrentModel {
        key: String,
        reply: oneshot::Sender<bool>,
    },
    Status {
        reply: oneshot::Sender<PreloadStatus>,
    },
    IsLoaded {
        key: String,
        reply: oneshot::Sender<bool>,
    },
    Shutdown,
}

/// Handle to the coordinator task.
///
/// Every method is fire-and-forget or answers with a degraded default when
/// the task is gone; this subsystem never surfaces errors (it must be
/// invisible when it fails).
pub struct Preloader {
    cmd_tx: mpsc::Sender<Command>,
    events: broadcast::Sender<PreloadEvent>,
    task: JoinHandle<()>,
}

impl Preloader {
    /// Spawn the coordinator.
    ///
    /// `worker: None` means cache-worker registration failed or is
    /// unsupported; the session degrades to "no background caching" and
    /// every query still answers.
    pub fn spawn<N: Net + 'static>(
        config: PreloadConfig,
        manifest: Arc<ModelManifest>,
        worker: Option<CacheHandle>,
        net: N,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(config.command_channel_capacity);
        let events = config
            .events_tx
            .clone()
            .unwrap_or_else(|| broadcast::channel(config.events_channel_capacity).0);
        let cancel = config.cancel.clone().unwrap_or_default();

        let driver = Driver {
            config,
            manifest,
            worker,
            net,
            state: PreloadState::new(),
            cmd_rx,
            events: events.clone(),
            waiters: HashMap::new(),
            cancel,
            rx_closed: false,
            drained_reported: false,
        };
        let task = tokio::spawn(driver.run());

        Self {
            cmd_tx,
            events,
            task,
        }
    }

    /// Feed a page signal (load, visibility, navigation, unload).
    pub async fn handle_event(&self, event: PageEvent) {
        let _ = self.cmd_tx.send(Command::Page(event)).await;
    }

    /// Promote an asset: front of the priority queue for a direct selection,
    /// back of it for speculative interest.
    pub async fn prioritize(&self, key: &str, high_priority: bool) {
        let _ = self
            .cmd_tx
            .send(Command::Prioritize {
                key: key.to_string(),
                high_priority,
            })
            .await;
    }

    /// Force an asset to load immediately, bypassing the landing-context
    /// gate, and wait for exactly that item. Returns whether the asset ended
    /// up loaded.
    pub async fn load_current_model(&self, key: &str) -> bool {
        let (reply, rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(Command::LoadCurrentModel {
                key: key.to_string(),
                reply,
            })
            .await
            .is_err()
        {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Snapshot of the coordinator state.
    pub async fn status(&self) -> PreloadStatus {
        let (reply, rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(Command::Status { reply })
            .await
            .is_err()
        {
            return PreloadStatus::disabled();
        }
        rx.await.unwrap_or_else(|_| PreloadStatus::disabled())
    }

    pub async fn is_model_loaded(&self, key: &str) -> bool {
        let (reply, rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(Command::IsLoaded {
                key: key.to_string(),
                reply,
            })
            .await
            .is_err()
        {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Subscribe to coordinator events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PreloadEvent> {
        self.events.subscribe()
    }

    /// Stop the coordinator. In-flight worker fetches are not cancelled.
    pub async fn shutdown(self) {
        let _ = self.cmd_tx.send(Command::Shutdown).await;
        let _ = self.task.await;
    }
}

struct Driver<N> {
    config: PreloadConfig,
    manifest: Arc<ModelManifest>,
    worker: Option<CacheHandle>,
    net: N,
    state: PreloadState,
    cmd_rx: mpsc::Receiver<Command>,
    events: broadcast::Sender<PreloadEvent>,
    /// Reply channels of `load_current_model` callers, keyed by asset key.
    waiters: HashMap<String, Vec<oneshot::Sender<bool>>>,
    cancel: CancellationToken,
    rx_closed: bool,
    drained_reported: bool,
}

impl<N: Net + 'static> Driver<N> {
    async fn run(mut self) {
        self.initialize().await;
        debug!(phase = ?self.state.phase(), "maquette-preload: coordinator ready");
        self.event_loop().await;
        debug!("maquette-preload: coordinator stopped");
    }

    /// Decide whether this session preloads at all, and how aggressively.
    async fn initialize(&mut self) {
        let path = self.config.initial_path.clone();
        self.state.set_on_landing(self.manifest.is_landing_path(&path));

        // A viewer page needs all its bandwidth for its own asset.
        if self.manifest.is_viewer_path(&path) {
            debug!(path = %path, "maquette-preload: viewer page, background preloading off");
            self.disable(DisabledReason::ViewerPage);
            return;
        }

        if self.worker.is_none() {
            warn!("maquette-preload: cache worker unavailable, no background caching");
            self.disable(DisabledReason::WorkerUnavailable);
            return;
        }

        match evaluate_hint(self.config.connection_hint) {
            HintDecision::Disable => {
                self.disable(DisabledReason::NetworkConstrained);
                return;
            }
            HintDecision::Class(class) => self.state.set_network_class(class),
        }

        if let Some(probe_path) = self.config.probe_path.clone() {
            match self.probe_url(&probe_path) {
                Some(url) => {
                    if let Some(class) =
                        probe_latency(&self.net, url, self.config.probe_timeout).await
                    {
                        self.state.set_network_class(class);
                    }
                }
                None => {
                    warn!(probe_path = %probe_path, "maquette-preload: invalid probe URL, skipping probe");
                }
            }
        }

        self.state.enable();
        debug!(network = ?self.state.network_class(), "maquette-preload: preloading enabled");
    }

    fn probe_url(&self, probe_path: &str) -> Option<Url> {
        let mut url = self.config.site_root.join(probe_path).ok()?;
        // Cache-busting query so the probe measures the network, not a cache.
        let ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        url.set_query(Some(&format!("nocache={ms}")));
        Some(url)
    }

    fn disable(&mut self, reason: DisabledReason) {
        self.state.disable();
        // Disabling clears the queues; anyone waiting on a cleared entry
        // must still get an answer.
        for (key, senders) in self.waiters.drain().collect::<Vec<_>>() {
            let loaded = self.state.is_loaded(&key);
            for sender in senders {
                let _ = sender.send(loaded);
            }
        }
        let _ = self.events.send(PreloadEvent::Disabled { reason });
    }

    async fn event_loop(&mut self) {
        loop {
            // Pending commands land before the next dispatch decision.
            while let Ok(cmd) = self.cmd_rx.try_recv() {
                if self.handle_command(cmd) {
                    return;
                }
            }

            if let Some(entry) = self.state.next_entry() {
                self.drained_reported = false;
                if self.dispatch(entry).await {
                    return;
                }
                continue;
            }

            if self.state.phase() == PreloadPhase::Dispatching
                && self.state.queues_empty()
                && !self.drained_reported
            {
                self.drained_reported = true;
                debug!("maquette-preload: queues drained");
                let _ = self.events.send(PreloadEvent::Drained);
            }

            if self.rx_closed {
                return;
            }

            tokio::select! {
                biased;

                () = self.cancel.cancelled() => return,

                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => {
                        if self.handle_command(cmd) {
                            return;
                        }
                    }
                    None => return,
                },
            }
        }
    }

    /// Preload one entry, handling commands while it is in flight.
    ///
    /// Commands are consumed with priority so that a promotion lands before
    /// the next pop and a pause lands before the next dispatch; the in-flight
    /// attempt itself is never cancelled. Returns true on shutdown.
    async fn dispatch(&mut self, entry: QueueEntry) -> bool {
        let key = entry.descriptor.key.clone();
        let _ = self.events.send(PreloadEvent::ItemStarted { key: key.clone() });

        let Some(worker) = self.worker.clone() else {
            self.finish_item(&key, false, false);
            return false;
        };

        let url = match self.manifest.asset_url(&self.config.site_root, &key) {
            Ok(url) => url,
            Err(e) => {
                warn!(key = %key, error = %e, "maquette-preload: cannot build asset URL");
                self.finish_item(&key, false, false);
                return false;
            }
        };

        trace!(
            key = %key,
            url = %url,
            size_mb = entry.descriptor.estimated_size_mb,
            priority = entry.is_priority,
            "maquette-preload: dispatching"
        );

        let item_timeout = self.config.item_timeout;
        let attempt = async move { tokio::time::timeout(item_timeout, worker.preload(url)).await };
        tokio::pin!(attempt);

        loop {
            tokio::select! {
                biased;

                cmd = self.cmd_rx.recv(), if !self.rx_closed => {
                    match cmd {
                        Some(cmd) => {
                            if self.handle_command(cmd) {
                                // Shutdown mid-flight; the worker's fetch
                                // continues unawaited and still warms the cache.
                                return true;
                            }
                        }
                        None => self.rx_closed = true,
                    }
                }

                result = &mut attempt => {
                    match result {
                        Ok(Ok(complete)) => {
                            self.finish_item(&key, complete.success, complete.cached);
                        }
                        Ok(Err(_)) => {
                            warn!(key = %key, "maquette-preload: cache worker gone, disabling session");
                            self.finish_item(&key, false, false);
                            self.disable(DisabledReason::WorkerUnavailable);
                        }
                        Err(_) => {
                            warn!(key = %key, "maquette-preload: preload timed out, moving on");
                            let _ = self.events.send(PreloadEvent::ItemTimedOut { key: key.clone() });
                            self.finish_item(&key, false, false);
                        }
                    }
                    return false;
                }
            }
        }
    }

    /// Completion always dequeues; success additionally records the key.
    fn finish_item(&mut self, key: &str, success: bool, cached: bool) {
        self.state.complete(key, success);
        if let Some(waiters) = self.waiters.remove(key) {
            let loaded = self.state.is_loaded(key);
            for waiter in waiters {
                let _ = waiter.send(loaded);
            }
        }
        let _ = self.events.send(PreloadEvent::ItemCompleted {
            key: key.to_string(),
            success,
            cached,
        });
    }

    /// Returns true on shutdown.
    fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Page(event) => self.handle_page_event(event),
            Command::Prioritize { key, high_priority } => {
                if self.state.prioritize(&self.manifest, &key, high_priority) {
                    self.drained_reported = false;
                }
            }
            Command::LoadCurrentModel { key, reply } => {
                if self.state.is_loaded(&key) {
                    let _ = reply.send(true);
                } else if self.worker.is_none() {
                    let _ = reply.send(false);
                } else if self.state.push_current_model(&self.manifest, &key) {
                    self.drained_reported = false;
                    self.waiters.entry(key).or_default().push(reply);
                } else {
                    warn!(key = %key, "maquette-preload: unknown model key");
                    let _ = reply.send(false);
                }
            }
            Command::Status { reply } => {
                let _ = reply.send(self.state.snapshot());
            }
            Command::IsLoaded { key, reply } => {
                let _ = reply.send(self.state.is_loaded(&key));
            }
            Command::Shutdown => return true,
        }
        false
    }

    fn handle_page_event(&mut self, event: PageEvent) {
        match event {
            PageEvent::Loaded => {
                if self.state.should_preload() {
                    self.state.build_queues(&self.manifest);
                    self.drained_reported = false;
                    let queued = self.state.snapshot().queue_length;
                    let _ = self.events.send(PreloadEvent::QueueBuilt { queued });
                    if self.state.start_dispatching() {
                        debug!(queued, "maquette-preload: dispatch started");
                    }
                }
            }
            PageEvent::Hidden => {
                if self.state.on_hidden() {
                    debug!("maquette-preload: page hidden, pausing");
                    let _ = self.events.send(PreloadEvent::Paused);
                }
            }
            PageEvent::Visible => {
                if self.state.on_visible() {
                    debug!("maquette-preload: page visible, resuming");
                    let _ = self.events.send(PreloadEvent::Resumed);
                }
            }
            PageEvent::Navigated { path } => {
                let landing = self.manifest.is_landing_path(&path);
                match self.state.on_navigated(landing) {
                    Some(true) => {
                        debug!(path = %path, "maquette-preload: back on landing, resuming");
                        let _ = self.events.send(PreloadEvent::Resumed);
                    }
                    Some(false) => {
                        debug!(path = %path, "maquette-preload: left landing, pausing");
                        let _ = self.events.send(PreloadEvent::Paused);
                    }
                    None => {}
                }
            }
            PageEvent::Unload => {
                self.state.on_unload();
            }
        }
    }
}

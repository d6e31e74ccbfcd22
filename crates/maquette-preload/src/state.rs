use std::collections::{HashSet, VecDeque};

use maquette_manifest::{AssetDescriptor, ModelManifest};
use tracing::trace;

use crate::{
    config::{SLOW_NETWORK_QUEUE_CAP, SLOW_NETWORK_SIZE_LIMIT_MB},
    network::NetworkClass,
};

/// Explicit dispatch state machine.
///
/// `Disabled` is terminal for the session; the other three cycle on page
/// events. Current-model entries bypass the machine entirely — a viewer
/// page may always force its own asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreloadPhase {
    /// Conditions rule out background preloading for this session.
    Disabled,
    /// Enabled but not dispatching (before the page load event, or drained).
    Idle,
    /// The dispatch loop is allowed to run.
    Dispatching,
    /// Dispatch suspended (hidden page, off-landing navigation, unload).
    Paused,
}

/// A queued preload candidate.
#[derive(Clone, Debug)]
pub struct QueueEntry {
    pub descriptor: AssetDescriptor,
    pub is_priority: bool,
    /// Must load even when background dispatch is otherwise gated off.
    pub is_current_model: bool,
}

/// Public snapshot of the coordinator.
#[derive(Clone, Debug, PartialEq)]
pub struct PreloadStatus {
    pub is_preloading: bool,
    pub loaded_keys: Vec<String>,
    pub queue_length: usize,
    pub priority_queue_length: usize,
    pub network_class: NetworkClass,
    pub should_preload: bool,
    pub phase: PreloadPhase,
}

impl PreloadStatus {
    /// Snapshot reported when the coordinator task is gone.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            is_preloading: false,
            loaded_keys: Vec::new(),
            queue_length: 0,
            priority_queue_length: 0,
            network_class: NetworkClass::Unknown,
            should_preload: false,
            phase: PreloadPhase::Disabled,
        }
    }
}

/// All mutable coordinator state. Owned by the driver task exclusively;
/// synchronous and directly testable.
///
/// Invariant: a key appears in at most one of `loaded` or the two queues,
/// and never twice across the queues.
#[derive(Debug)]
pub struct PreloadState {
    phase: PreloadPhase,
    should_preload: bool,
    on_landing: bool,
    network_class: NetworkClass,
    regular_queue: VecDeque<QueueEntry>,
    priority_queue: VecDeque<QueueEntry>,
    loaded: HashSet<String>,
}

impl PreloadState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: PreloadPhase::Idle,
            should_preload: false,
            on_landing: true,
            network_class: NetworkClass::Unknown,
            regular_queue: VecDeque::new(),
            priority_queue: VecDeque::new(),
            loaded: HashSet::new(),
        }
    }

    pub fn phase(&self) -> PreloadPhase {
        self.phase
    }

    pub fn should_preload(&self) -> bool {
        self.should_preload
    }

    pub fn on_landing(&self) -> bool {
        self.on_landing
    }

    pub fn set_on_landing(&mut self, on_landing: bool) {
        self.on_landing = on_landing;
    }

    pub fn network_class(&self) -> NetworkClass {
        self.network_class
    }

    pub fn set_network_class(&mut self, class: NetworkClass) {
        self.network_class = class;
    }

    /// Permanently disable background preloading for this session.
    pub fn disable(&mut self) {
        self.should_preload = false;
        self.phase = PreloadPhase::Disabled;
        self.regular_queue.clear();
        self.priority_queue.clear();
    }

    /// Conditions permit preloading this session.
    pub fn enable(&mut self) {
        self.should_preload = true;
        if self.phase == PreloadPhase::Disabled {
            self.phase = PreloadPhase::Idle;
        }
    }

    /// Start the dispatch loop (page load fired, queues built).
    pub fn start_dispatching(&mut self) -> bool {
        if self.should_preload && self.phase == PreloadPhase::Idle {
            self.phase = PreloadPhase::Dispatching;
            return true;
        }
        false
    }

    fn background_dispatch_allowed(&self) -> bool {
        self.phase == PreloadPhase::Dispatching && self.on_landing
    }

    /// Build the regular queue from the registry, ascending priority.
    ///
    /// On a slow network the candidate set is restricted to small assets
    /// and capped.
    pub fn build_queues(&mut self, manifest: &ModelManifest) {
        self.regular_queue.clear();

        let candidates = manifest
            .by_priority()
            .into_iter()
            .filter(|d| !self.loaded.contains(&d.key))
            .filter(|d| !self.in_priority_queue(&d.key));

        let entries: Vec<QueueEntry> = if self.network_class == NetworkClass::Slow {
            candidates
                .filter(|d| d.estimated_size_mb < SLOW_NETWORK_SIZE_LIMIT_MB)
                .take(SLOW_NETWORK_QUEUE_CAP)
                .map(|d| QueueEntry {
                    descriptor: d.clone(),
                    is_priority: false,
                    is_current_model: false,
                })
                .collect()
        } else {
            candidates
                .map(|d| QueueEntry {
                    descriptor: d.clone(),
                    is_priority: false,
                    is_current_model: false,
                })
                .collect()
        };

        self.regular_queue = entries.into();
        trace!(
            queued = self.regular_queue.len(),
            network = ?self.network_class,
            "maquette-preload: queue built"
        );
    }

    fn in_priority_queue(&self, key: &str) -> bool {
        self.priority_queue.iter().any(|e| e.descriptor.key == key)
    }

    fn remove_from_queues(&mut self, key: &str) {
        self.regular_queue.retain(|e| e.descriptor.key != key);
        self.priority_queue.retain(|e| e.descriptor.key != key);
    }

    /// Promote an asset to the priority queue.
    ///
    /// Front insertion for direct selection (click), back insertion for
    /// speculative interest (hover). No-op when already loaded or unknown.
    /// Returns whether an entry was enqueued.
    pub fn prioritize(&mut self, manifest: &ModelManifest, key: &str, high_priority: bool) -> bool {
        if self.loaded.contains(key) {
            return false;
        }
        let Some(descriptor) = manifest.get(key) else {
            return false;
        };

        self.remove_from_queues(key);

        let entry = QueueEntry {
            descriptor: descriptor.clone(),
            is_priority: true,
            is_current_model: false,
        };
        if high_priority {
            self.priority_queue.push_front(entry);
        } else {
            self.priority_queue.push_back(entry);
        }
        trace!(key = %key, high_priority, "maquette-preload: promoted");
        true
    }

    /// Front-insert a current-model entry. Such entries dispatch even when
    /// the session is paused or disabled.
    pub fn push_current_model(&mut self, manifest: &ModelManifest, key: &str) -> bool {
        let Some(descriptor) = manifest.get(key) else {
            return false;
        };

        self.remove_from_queues(key);
        self.priority_queue.push_front(QueueEntry {
            descriptor: descriptor.clone(),
            is_priority: true,
            is_current_model: true,
        });
        true
    }

    /// Take the next entry to dispatch, if the gates allow one.
    ///
    /// The priority queue always drains before the regular queue. A
    /// current-model head bypasses the phase and landing gates.
    pub fn next_entry(&mut self) -> Option<QueueEntry> {
        if let Some(front) = self.priority_queue.front() {
            if front.is_current_model || self.background_dispatch_allowed() {
                return self.priority_queue.pop_front();
            }
            return None;
        }
        if self.background_dispatch_allowed() {
            return self.regular_queue.pop_front();
        }
        None
    }

    /// Record the outcome of a dispatched entry. The entry left its queue
    /// at dispatch time; success additionally marks the key loaded.
    pub fn complete(&mut self, key: &str, success: bool) {
        if success {
            self.loaded.insert(key.to_string());
        }
    }

    pub fn is_loaded(&self, key: &str) -> bool {
        self.loaded.contains(key)
    }

    pub fn queues_empty(&self) -> bool {
        self.regular_queue.is_empty() && self.priority_queue.is_empty()
    }

    // Page-event transitions. Each returns whether the phase changed so the
    // driver can publish the matching event.

    pub fn on_hidden(&mut self) -> bool {
        if self.phase == PreloadPhase::Dispatching {
            self.phase = PreloadPhase::Paused;
            return true;
        }
        false
    }

    pub fn on_visible(&mut self) -> bool {
        if self.phase == PreloadPhase::Paused && self.should_preload && self.on_landing {
            self.phase = PreloadPhase::Dispatching;
            return true;
        }
        false
    }

    /// Returns `Some(true)` on resume, `Some(false)` on pause, `None` when
    /// nothing changed.
    pub fn on_navigated(&mut self, on_landing: bool) -> Option<bool> {
        self.on_landing = on_landing;
        if on_landing && self.should_preload && self.phase == PreloadPhase::Paused {
            self.phase = PreloadPhase::Dispatching;
            return Some(true);
        }
        if !on_landing && self.phase == PreloadPhase::Dispatching {
            self.phase = PreloadPhase::Paused;
            return Some(false);
        }
        None
    }

    pub fn on_unload(&mut self) {
        if self.phase == PreloadPhase::Dispatching {
            self.phase = PreloadPhase::Paused;
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> PreloadStatus {
        let mut loaded_keys: Vec<String> = self.loaded.iter().cloned().collect();
        loaded_keys.sort();
        PreloadStatus {
            is_preloading: self.phase == PreloadPhase::Dispatching,
            loaded_keys,
            queue_length: self.regular_queue.len(),
            priority_queue_length: self.priority_queue.len(),
            network_class: self.network_class,
            should_preload: self.should_preload,
            phase: self.phase,
        }
    }
}

impl Default for PreloadState {
    fn default() -> Self {
        Self::new()
    }
}

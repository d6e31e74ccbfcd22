/// Page signals fed to the coordinator by out-of-scope glue code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageEvent {
    /// The page's own load completed. Background dispatch never starts
    /// before this.
    Loaded,
    /// Page became hidden.
    Hidden,
    /// Page became visible again.
    Visible,
    /// Path or hash change, or history back/forward.
    Navigated { path: String },
    /// Imminent unload. No further dispatch attempts; in-flight work is
    /// allowed to finish.
    Unload,
}

/// Why the session was permanently disabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisabledReason {
    /// The current page is an asset-heavy viewer page that needs its
    /// bandwidth for its own model.
    ViewerPage,
    /// Cache worker registration failed or is unsupported.
    WorkerUnavailable,
    /// Slow connection class or data saver.
    NetworkConstrained,
}

/// Observability events published on the coordinator's broadcast bus.
///
/// Publishing never blocks; slow subscribers lag, they do not stall
/// dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PreloadEvent {
    Disabled { reason: DisabledReason },
    QueueBuilt { queued: usize },
    ItemStarted { key: String },
    ItemCompleted { key: String, success: bool, cached: bool },
    ItemTimedOut { key: String },
    Paused,
    Resumed,
    Drained,
}

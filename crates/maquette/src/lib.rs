#![forbid(unsafe_code)]

//! # Maquette
//!
//! Background model preloading and caching for educational 3D viewer pages.
//!
//! Two cooperating components: a cache worker that owns the durable model
//! cache and serves intercepted asset requests, and a preload coordinator
//! that decides what to warm and in which order. [`PreloadSystem`] wires
//! both from one config.
//!
//! ## Quick start
//!
//! ```ignore
//! use maquette::prelude::*;
//!
//! let config = SystemConfig::new(
//!     Url::parse("https://models.example.com/")?,
//!     "/var/cache/maquette",
//! );
//! let system = PreloadSystem::start(config);
//!
//! system.preloader().handle_event(PageEvent::Loaded).await;
//! ```

// ── Re-export sub-crates ────────────────────────────────────────────────

pub mod cache {
    pub use maquette_cache::*;
}

pub mod manifest {
    pub use maquette_manifest::*;
}

pub mod net {
    pub use maquette_net::*;
}

pub mod preload {
    pub use maquette_preload::*;
}

pub mod store {
    pub use maquette_store::*;
}

// ── System wiring ───────────────────────────────────────────────────────

mod system;
mod validate;

pub use system::{PreloadSystem, SystemConfig};
pub use validate::{validate_manifest, MissingAsset};

// ── Prelude ─────────────────────────────────────────────────────────────

pub mod prelude {
    pub use maquette_cache::{CacheHandle, CacheStatusReport, ModelResponse, PreloadComplete};
    pub use maquette_manifest::{AssetDescriptor, ModelManifest};
    pub use maquette_net::{HttpClient, Net, NetOptions};
    pub use maquette_preload::{ConnectionHint, PageEvent, PreloadEvent, PreloadStatus, Preloader};
    pub use maquette_store::{ModelStore, StoreOptions};
    pub use url::Url;

    pub use crate::{PreloadSystem, SystemConfig};
}

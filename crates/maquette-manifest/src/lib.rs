#![forbid(unsafe_code)]

//! Shared asset manifest.
//!
//! One registry of downloadable 3D assets, read by both the preload
//! coordinator (scheduling) and the cache worker (interception and cache
//! status). Keeping it in a single crate removes the risk of the two
//! components drifting apart on paths or counts.

mod descriptor;
mod error;
mod manifest;
mod registry;

pub use crate::{
    descriptor::AssetDescriptor,
    error::{ManifestError, ManifestResult},
    manifest::{ModelManifest, ModelManifestBuilder},
};

/// File extensions recognized as 3D model assets.
pub const MODEL_EXTENSIONS: &[&str] = &[".glb", ".gltf"];

/// Base name of the durable cache namespace.
pub const CACHE_NAME: &str = "maquette-models";

/// Cache namespace version. Bumping this is the only supported way to force
/// a full cache invalidation across all clients.
pub const CACHE_VERSION: u32 = 1;

/// Directory name of the current cache namespace.
#[must_use]
pub fn cache_namespace() -> String {
    format!("{CACHE_NAME}-v{CACHE_VERSION}")
}

/// Whether a URL path names a recognized 3D model file.
#[must_use]
pub fn is_model_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    MODEL_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

use std::{path::PathBuf, time::Duration};

/// Fixed expiry window for cache entries: 7 days.
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Clone, Debug)]
pub struct StoreOptions {
    /// Directory holding the versioned cache namespaces.
    pub root_dir: PathBuf,
    /// Base name of the cache namespace.
    pub cache_name: String,
    /// Namespace version. Opening a store deletes sibling namespaces with a
    /// different version.
    pub version: u32,
    /// Per-entry freshness window.
    pub expiry: Duration,
}

impl StoreOptions {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            cache_name: maquette_manifest::CACHE_NAME.to_string(),
            version: maquette_manifest::CACHE_VERSION,
            expiry: DEFAULT_EXPIRY,
        }
    }

    #[must_use]
    pub fn with_cache_name(mut self, name: impl Into<String>) -> Self {
        self.cache_name = name.into();
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    /// Directory name of this namespace.
    #[must_use]
    pub fn namespace(&self) -> String {
        format!("{}-v{}", self.cache_name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_manifest() {
        let options = StoreOptions::new("/tmp/cache");
        assert_eq!(options.cache_name, maquette_manifest::CACHE_NAME);
        assert_eq!(options.version, maquette_manifest::CACHE_VERSION);
        assert_eq!(options.expiry, DEFAULT_EXPIRY);
        assert_eq!(options.namespace(), maquette_manifest::cache_namespace());
    }

    #[test]
    fn namespace_embeds_version() {
        let options = StoreOptions::new("/tmp/cache")
            .with_cache_name("models")
            .with_version(7);
        assert_eq!(options.namespace(), "models-v7");
    }
}

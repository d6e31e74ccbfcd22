use std::collections::HashMap;

use url::Url;

use crate::{
    descriptor::AssetDescriptor,
    error::{ManifestError, ManifestResult},
    is_model_path, registry,
};

/// Immutable registry of known downloadable assets.
///
/// Built once at session start. Both the coordinator and the cache worker
/// hold a shared reference; neither mutates it.
#[derive(Clone, Debug)]
pub struct ModelManifest {
    descriptors: Vec<AssetDescriptor>,
    index: HashMap<String, usize>,
    topics: Vec<String>,
}

impl ModelManifest {
    /// The built-in registry of educational models.
    #[must_use]
    pub fn default_registry() -> Self {
        registry::default_registry()
    }

    pub fn builder() -> ModelManifestBuilder {
        ModelManifestBuilder::new()
    }

    /// Descriptors in declaration order.
    pub fn descriptors(&self) -> &[AssetDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, key: &str) -> Option<&AssetDescriptor> {
        self.index.get(key).map(|&i| &self.descriptors[i])
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptors sorted by ascending priority.
    #[must_use]
    pub fn by_priority(&self) -> Vec<&AssetDescriptor> {
        let mut sorted: Vec<&AssetDescriptor> = self.descriptors.iter().collect();
        sorted.sort_by_key(|d| d.priority);
        sorted
    }

    /// Absolute URL of an asset, resolved against the site root.
    pub fn asset_url(&self, site_root: &Url, key: &str) -> ManifestResult<Url> {
        let desc = self
            .get(key)
            .ok_or_else(|| ManifestError::UnknownKey(key.to_string()))?;
        site_root
            .join(&desc.path)
            .map_err(|e| ManifestError::InvalidPath {
                path: desc.path.clone(),
                reason: e.to_string(),
            })
    }

    /// Whether a page path belongs to one of the asset-heavy viewer pages.
    ///
    /// A viewer page lives under one of the topic directories the registry's
    /// asset paths start with.
    #[must_use]
    pub fn is_viewer_path(&self, path: &str) -> bool {
        self.topics.iter().any(|topic| {
            let needle = format!("/{topic}/");
            path.contains(&needle) || path.starts_with(&format!("{topic}/"))
        })
    }

    /// Whether a page path is the landing context (entry/index page).
    #[must_use]
    pub fn is_landing_path(&self, path: &str) -> bool {
        if self.is_viewer_path(path) || is_model_path(path) {
            return false;
        }
        path.is_empty() || path.ends_with('/') || path.ends_with("index.html")
    }
}

/// Builder for custom registries. The registry is fixed once built.
#[derive(Debug, Default)]
pub struct ModelManifestBuilder {
    descriptors: Vec<AssetDescriptor>,
}

impl ModelManifestBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn descriptor(mut self, descriptor: AssetDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    #[must_use]
    pub fn model(
        self,
        key: impl Into<String>,
        path: impl Into<String>,
        priority: u32,
        estimated_size_mb: f32,
        category: impl Into<String>,
    ) -> Self {
        self.descriptor(AssetDescriptor::new(
            key,
            path,
            priority,
            estimated_size_mb,
            category,
        ))
    }

    /// # Errors
    ///
    /// Returns [`ManifestError::DuplicateKey`] if two descriptors share a key.
    pub fn build(self) -> ManifestResult<ModelManifest> {
        let mut index = HashMap::with_capacity(self.descriptors.len());
        let mut topics: Vec<String> = Vec::new();

        for (i, desc) in self.descriptors.iter().enumerate() {
            if index.insert(desc.key.clone(), i).is_some() {
                return Err(ManifestError::DuplicateKey(desc.key.clone()));
            }
            if let Some(topic) = desc.topic() {
                if !topics.iter().any(|t| t == topic) {
                    topics.push(topic.to_string());
                }
            }
        }

        Ok(ModelManifest {
            descriptors: self.descriptors,
            index,
            topics,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn small_manifest() -> ModelManifest {
        ModelManifest::builder()
            .model("atom", "atom/models/atom.glb", 2, 2.5, "science")
            .model("neuron", "neuron/models/neuron.glb", 1, 6.4, "biology")
            .model(
                "dc-motor",
                "dc motor/models/dc_motor.glb",
                3,
                9.1,
                "electrical",
            )
            .build()
            .expect("manifest builds")
    }

    #[test]
    fn by_priority_sorts_ascending() {
        let manifest = small_manifest();
        let keys: Vec<&str> = manifest
            .by_priority()
            .iter()
            .map(|d| d.key.as_str())
            .collect();
        assert_eq!(keys, ["neuron", "atom", "dc-motor"]);
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let result = ModelManifest::builder()
            .model("atom", "atom/models/atom.glb", 1, 2.5, "science")
            .model("atom", "atom/models/atom2.glb", 2, 2.5, "science")
            .build();
        assert!(matches!(result, Err(ManifestError::DuplicateKey(k)) if k == "atom"));
    }

    #[test]
    fn asset_url_joins_site_root() {
        let manifest = small_manifest();
        let root = Url::parse("https://models.example.com/").unwrap();

        let url = manifest.asset_url(&root, "atom").unwrap();
        assert_eq!(url.as_str(), "https://models.example.com/atom/models/atom.glb");

        assert!(matches!(
            manifest.asset_url(&root, "nonexistent"),
            Err(ManifestError::UnknownKey(_))
        ));
    }

    #[test]
    fn asset_url_percent_encodes_spaces() {
        let manifest = small_manifest();
        let root = Url::parse("https://models.example.com/").unwrap();

        let url = manifest.asset_url(&root, "dc-motor").unwrap();
        assert_eq!(
            url.as_str(),
            "https://models.example.com/dc%20motor/models/dc_motor.glb"
        );
    }

    #[rstest]
    #[case::viewer_subpage("/atom/index.html", true)]
    #[case::viewer_nested("/site/neuron/viewer.html", true)]
    #[case::viewer_no_leading_slash("atom/index.html", true)]
    #[case::landing_root("/", false)]
    #[case::landing_index("/index.html", false)]
    #[case::unrelated("/about/", false)]
    fn viewer_path_classification(#[case] path: &str, #[case] expected: bool) {
        let manifest = small_manifest();
        assert_eq!(manifest.is_viewer_path(path), expected);
    }

    #[rstest]
    #[case::root("/", true)]
    #[case::index("/index.html", true)]
    #[case::empty("", true)]
    #[case::trailing_slash("/site/", true)]
    #[case::viewer("/atom/index.html", false)]
    #[case::model_file("/atom/models/atom.glb", false)]
    #[case::other_page("/about.html", false)]
    fn landing_path_classification(#[case] path: &str, #[case] expected: bool) {
        let manifest = small_manifest();
        assert_eq!(manifest.is_landing_path(path), expected);
    }

    #[test]
    fn default_registry_has_unique_keys_and_priorities_cover_all() {
        let manifest = ModelManifest::default_registry();
        assert!(!manifest.is_empty());
        assert_eq!(manifest.by_priority().len(), manifest.len());
        assert!(manifest.contains("induction-motor-rotor"));
        assert!(manifest.contains("solar-system"));
    }
}

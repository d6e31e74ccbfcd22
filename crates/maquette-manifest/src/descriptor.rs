/// Static description of one downloadable 3D asset.
///
/// Compiled into the registry at startup and immutable for the session.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetDescriptor {
    /// Unique identifier, stable across sessions.
    pub key: String,
    /// Resource path relative to the site root.
    pub path: String,
    /// Scheduling priority. Lower is more important.
    pub priority: u32,
    /// Estimated download size in megabytes. Used only to filter candidates
    /// under constrained network conditions.
    pub estimated_size_mb: f32,
    /// Free-form grouping tag. Informational, not used for scheduling.
    pub category: String,
}

impl AssetDescriptor {
    pub fn new(
        key: impl Into<String>,
        path: impl Into<String>,
        priority: u32,
        estimated_size_mb: f32,
        category: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            path: path.into(),
            priority,
            estimated_size_mb,
            category: category.into(),
        }
    }

    /// First path component, i.e. the topic directory the asset lives under.
    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.path.split('/').next().filter(|s| !s.is_empty())
    }
}

//! Registry configuration.

/// Default suffix appended to a type name to form its meta-type name.
pub const DEFAULT_META_SUFFIX: &str = ".Type";

/// Configuration for a [`Registry`](crate::Registry).
///
/// # Example
///
/// ```rust
/// use oxidex_reflect::RegistryConfig;
///
/// let config = RegistryConfig::default()
///     .with_meta_suffix("$Meta")
///     .with_snapshot_cache(true);
///
/// assert_eq!(config.meta_type_name("Widget"), "Widget$Meta");
/// assert!(config.snapshot_cache());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    meta_suffix: String,
    snapshot_cache: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            meta_suffix: DEFAULT_META_SUFFIX.to_string(),
            snapshot_cache: false,
        }
    }
}

impl RegistryConfig {
    /// Sets the suffix used to derive meta-type names.
    #[must_use]
    pub fn with_meta_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.meta_suffix = suffix.into();
        self
    }

    /// Enables or disables the read-only snapshot cache.
    ///
    /// When enabled, type enumeration is served from a snapshot taken on first
    /// use until [`Registry::invalidate_snapshot`](crate::Registry::invalidate_snapshot)
    /// is called.
    #[must_use]
    pub fn with_snapshot_cache(mut self, enabled: bool) -> Self {
        self.snapshot_cache = enabled;
        self
    }

    /// Returns the meta-type suffix.
    #[must_use]
    pub fn meta_suffix(&self) -> &str {
        &self.meta_suffix
    }

    /// Returns `true` if the snapshot cache is enabled.
    #[must_use]
    pub fn snapshot_cache(&self) -> bool {
        self.snapshot_cache
    }

    /// Derives the meta-type name conventionally associated with `type_name`.
    #[must_use]
    pub fn meta_type_name(&self, type_name: &str) -> String {
        format!("{type_name}{}", self.meta_suffix)
    }
}

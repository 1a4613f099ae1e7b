//! The reflective registry.
//!
//! [`Registry`] answers queries against a [`Catalog`]. It owns no descriptor
//! storage: every query goes to the catalog, except type enumeration when the
//! snapshot cache is enabled.
//!
//! The queries are split by concern:
//!
//! - this module: name resolution, enumeration, version tagging
//! - [`hierarchy`]: super-type walks and subtype queries
//! - [`conformance`]: inheritance-aware member and protocol queries
//! - [`snapshot`]: the read-only snapshot cache
//!
//! # Example
//!
//! ```rust
//! use oxidex_reflect::{InMemoryCatalog, Registry, TypeBuilder};
//!
//! let catalog = InMemoryCatalog::new();
//! TypeBuilder::new("Base").register(&catalog).unwrap();
//! TypeBuilder::new("Derived").super_type("Base").register(&catalog).unwrap();
//!
//! let registry = Registry::new(catalog);
//! let derived = registry.resolve_type("Derived").unwrap().unwrap();
//! let base = registry.super_type(&derived).unwrap().unwrap();
//! assert_eq!(base.name(), "Base");
//!
//! assert!(registry.resolve_type("DoesNotExist").unwrap().is_none());
//! ```

pub mod conformance;
pub mod hierarchy;
pub mod snapshot;

pub use hierarchy::Ancestors;
pub use snapshot::Snapshot;

use crate::catalog::Catalog;
use crate::config::RegistryConfig;
use crate::descriptor::{MemberCategory, MemberDescriptor, ProtocolDescriptor, TypeDescriptor};
use crate::error::{Error, Result};
use log::{debug, trace};
use snapshot::SnapshotCache;
use std::sync::Arc;

/// Read-only reflective view over a [`Catalog`].
///
/// # Thread Safety
///
/// `Registry<C>` is `Send + Sync` because every `Catalog` is. Queries may run
/// concurrently. [`tag_version`](Registry::tag_version) is the only write;
/// callers serialize tagging of any one type themselves.
pub struct Registry<C: Catalog> {
    catalog: C,
    config: RegistryConfig,
    cache: SnapshotCache,
}

impl<C: Catalog> Registry<C> {
    /// Creates a registry with the default configuration.
    pub fn new(catalog: C) -> Self {
        Self::with_config(catalog, RegistryConfig::default())
    }

    /// Creates a registry with an explicit configuration.
    pub fn with_config(catalog: C, config: RegistryConfig) -> Self {
        Self {
            catalog,
            config,
            cache: SnapshotCache::default(),
        }
    }

    /// Returns the underlying catalog.
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // ========================================================================
    // Name Resolution
    // ========================================================================

    /// Resolves a type by exact, case-sensitive name.
    ///
    /// # Arguments
    ///
    /// * `name` - Type name, meta-types included (`"Base.Type"`)
    ///
    /// # Returns
    ///
    /// `Ok(Some(descriptor))` if registered, `Ok(None)` otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// use oxidex_reflect::{InMemoryCatalog, Registry, TypeBuilder};
    ///
    /// let catalog = InMemoryCatalog::new();
    /// TypeBuilder::new("Base").register(&catalog).unwrap();
    /// let registry = Registry::new(catalog);
    ///
    /// assert!(registry.resolve_type("Base").unwrap().is_some());
    /// assert!(registry.resolve_type("base").unwrap().is_none());
    /// assert!(registry.resolve_type("").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `name` is empty.
    pub fn resolve_type(&self, name: &str) -> Result<Option<TypeDescriptor>> {
        if name.is_empty() {
            return Err(Error::invalid_argument("type name must not be empty"));
        }
        let found = self.catalog.lookup(name);
        trace!("resolve_type('{name}') -> {}", found.is_some());
        Ok(found)
    }

    /// Resolves the meta-type of `ty` through the configured naming convention.
    ///
    /// # Arguments
    ///
    /// * `ty` - Instance type whose meta-type is wanted
    ///
    /// # Returns
    ///
    /// The meta-type, or `None` if `ty` was registered without one.
    ///
    /// # Example
    ///
    /// ```
    /// use oxidex_reflect::{InMemoryCatalog, Registry, TypeBuilder};
    ///
    /// let catalog = InMemoryCatalog::new();
    /// TypeBuilder::new("Base").register(&catalog).unwrap();
    /// let registry = Registry::new(catalog);
    ///
    /// let base = registry.resolve_type("Base").unwrap().unwrap();
    /// let meta = registry.resolve_meta_type(&base).unwrap().unwrap();
    /// assert_eq!(meta.name(), "Base.Type");
    /// assert!(meta.is_meta());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::KindMismatch`] if the derived name is registered but
    /// is not a meta-type.
    pub fn resolve_meta_type(&self, ty: &TypeDescriptor) -> Result<Option<TypeDescriptor>> {
        let meta_name = self.config.meta_type_name(ty.name());
        match self.resolve_type(&meta_name)? {
            Some(meta) if !meta.is_meta() => Err(Error::KindMismatch {
                name: meta_name,
                expected: "meta-type",
            }),
            found => Ok(found),
        }
    }

    /// Resolves a protocol by exact name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `name` is empty.
    pub fn resolve_protocol(&self, name: &str) -> Result<Option<ProtocolDescriptor>> {
        if name.is_empty() {
            return Err(Error::invalid_argument("protocol name must not be empty"));
        }
        Ok(self.catalog.lookup_protocol(name))
    }

    // ========================================================================
    // Enumeration
    // ========================================================================

    /// Lists every registered type accepted by `predicate`.
    ///
    /// The catalog is always enumerated in full and filtered afterwards, so
    /// the cost is proportional to the number of registered types. Types
    /// unregistered while the enumeration runs are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InconsistentCatalog`] if the catalog returns more
    /// slots than it reported.
    ///
    /// # Arguments
    ///
    /// * `predicate` - Applied to each retrieved type; `true` keeps it
    ///
    /// # Example
    ///
    /// ```
    /// use oxidex_reflect::{InMemoryCatalog, Registry, TypeBuilder};
    ///
    /// let catalog = InMemoryCatalog::new();
    /// TypeBuilder::new("Base").register(&catalog).unwrap();
    /// TypeBuilder::new("Derived").super_type("Base").register(&catalog).unwrap();
    /// let registry = Registry::new(catalog);
    ///
    /// let plain = registry.list_all_types(|ty| !ty.is_meta()).unwrap();
    /// assert_eq!(plain.len(), 2);
    /// assert_eq!(registry.list_all_types_unfiltered().unwrap().len(), 4);
    /// ```
    pub fn list_all_types<F>(&self, mut predicate: F) -> Result<Vec<TypeDescriptor>>
    where
        F: FnMut(&TypeDescriptor) -> bool,
    {
        let types = if self.config.snapshot_cache() {
            self.snapshot()?.types().to_vec()
        } else {
            self.enumerate_types()?
        };
        Ok(types.into_iter().filter(|ty| predicate(ty)).collect())
    }

    /// Lists every registered type.
    ///
    /// # Errors
    ///
    /// See [`list_all_types`](Registry::list_all_types).
    pub fn list_all_types_unfiltered(&self) -> Result<Vec<TypeDescriptor>> {
        self.list_all_types(|_| true)
    }

    /// Lists the methods declared directly on `ty`.
    pub fn list_methods(&self, ty: &TypeDescriptor) -> Vec<MemberDescriptor> {
        self.catalog.members(ty, MemberCategory::Method)
    }

    /// Lists the properties declared directly on `ty`.
    pub fn list_properties(&self, ty: &TypeDescriptor) -> Vec<MemberDescriptor> {
        self.catalog.members(ty, MemberCategory::Property)
    }

    /// Lists the instance variables declared directly on `ty`.
    pub fn list_instance_variables(&self, ty: &TypeDescriptor) -> Vec<MemberDescriptor> {
        self.catalog.members(ty, MemberCategory::InstanceVariable)
    }

    /// Lists the protocols `ty` adopts directly.
    pub fn list_protocols(&self, ty: &TypeDescriptor) -> Vec<ProtocolDescriptor> {
        self.catalog.protocols(ty)
    }

    /// Lists every registered protocol.
    pub fn list_all_protocols(&self) -> Vec<ProtocolDescriptor> {
        self.catalog.all_protocols()
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Returns a snapshot of the registered types.
    ///
    /// With the snapshot cache enabled this returns the cached snapshot,
    /// taking one first if needed. Otherwise every call enumerates afresh.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InconsistentCatalog`] if enumeration fails.
    pub fn snapshot(&self) -> Result<Arc<Snapshot>> {
        if let Some(cached) = self.cache.get() {
            return Ok(cached);
        }
        let snapshot = Arc::new(Snapshot::new(self.enumerate_types()?));
        if self.config.snapshot_cache() {
            self.cache.store(Arc::clone(&snapshot));
            debug!("cached type snapshot ({} types)", snapshot.len());
        }
        Ok(snapshot)
    }

    /// Drops the cached snapshot. The next enumeration reads the catalog.
    pub fn invalidate_snapshot(&self) {
        if self.cache.invalidate() {
            debug!("type snapshot invalidated");
        }
    }

    /// Count, allocate, then populate. Absent slots are skipped.
    fn enumerate_types(&self) -> Result<Vec<TypeDescriptor>> {
        let expected = self.catalog.count();
        let slots = self.catalog.snapshot(expected);
        if slots.len() > expected {
            return Err(Error::InconsistentCatalog {
                requested: expected,
                returned: slots.len(),
            });
        }

        let mut types = Vec::with_capacity(slots.len());
        let mut skipped = 0usize;
        for slot in slots {
            match slot {
                Some(ty) => types.push(ty),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!("skipped {skipped} types unregistered during enumeration");
        }
        trace!("enumerated {} of {expected} types", types.len());
        Ok(types)
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Overwrites the version tag of `ty`.
    ///
    /// Callers serialize all tagging of a given type; the catalog gives no
    /// atomicity across concurrent writers.
    ///
    /// # Arguments
    ///
    /// * `ty` - A live handle, as returned by resolution or enumeration
    /// * `value` - New version tag
    ///
    /// # Example
    ///
    /// ```
    /// use oxidex_reflect::{InMemoryCatalog, Registry, TypeBuilder};
    ///
    /// let catalog = InMemoryCatalog::new();
    /// TypeBuilder::new("Base").register(&catalog).unwrap();
    /// let registry = Registry::new(catalog);
    ///
    /// let base = registry.resolve_type("Base").unwrap().unwrap();
    /// registry.tag_version(&base, 5).unwrap();
    /// assert_eq!(registry.resolve_type("Base").unwrap().unwrap().version(), 5);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `ty` is no longer registered.
    pub fn tag_version(&self, ty: &TypeDescriptor, value: i32) -> Result<()> {
        match self.catalog.lookup(ty.name()) {
            Some(live) if live == *ty => {
                self.catalog.set_version(&live, value);
                debug!("tagged '{}' with version {value}", ty.name());
                Ok(())
            }
            _ => Err(Error::invalid_argument(format!(
                "type '{}' is not registered",
                ty.name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{InMemoryCatalog, ProtocolBuilder, TypeBuilder};

    fn registry() -> Registry<InMemoryCatalog> {
        let catalog = InMemoryCatalog::new();
        ProtocolBuilder::new("NSObject")
            .required("hash", "q@:")
            .register(&catalog)
            .unwrap();
        TypeBuilder::new("Base")
            .method("init", "@@:")
            .property("name", "T@\"NSString\",C,N,V_name")
            .ivar("_name", "@")
            .register(&catalog)
            .unwrap();
        TypeBuilder::new("Derived")
            .super_type("Base")
            .register(&catalog)
            .unwrap();
        Registry::new(catalog)
    }

    #[test]
    fn test_resolve_type() {
        let registry = registry();
        let ty = registry.resolve_type("Base").unwrap().unwrap();
        assert_eq!(ty.name(), "Base");
        assert!(registry.resolve_type("base").unwrap().is_none());
        assert!(registry.resolve_type("Bas").unwrap().is_none());
    }

    #[test]
    fn test_resolve_empty_name() {
        let registry = registry();
        assert!(matches!(
            registry.resolve_type(""),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            registry.resolve_protocol(""),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_resolve_meta_type() {
        let registry = registry();
        let base = registry.resolve_type("Base").unwrap().unwrap();
        let meta = registry.resolve_meta_type(&base).unwrap().unwrap();
        assert_eq!(meta.name(), "Base.Type");
        assert!(meta.is_meta());

        // The meta-type of a meta-type is not registered.
        assert!(registry.resolve_meta_type(&meta).unwrap().is_none());
    }

    #[test]
    fn test_resolve_meta_type_kind_mismatch() {
        let catalog = InMemoryCatalog::new();
        TypeBuilder::new("Widget").without_meta().register(&catalog).unwrap();
        TypeBuilder::new("Widget.Type")
            .without_meta()
            .register(&catalog)
            .unwrap();
        let registry = Registry::new(catalog);
        let widget = registry.resolve_type("Widget").unwrap().unwrap();
        assert_eq!(
            registry.resolve_meta_type(&widget).unwrap_err(),
            Error::KindMismatch {
                name: "Widget.Type".into(),
                expected: "meta-type"
            }
        );
    }

    #[test]
    fn test_list_all_types_with_predicate() {
        let registry = registry();
        assert_eq!(registry.list_all_types_unfiltered().unwrap().len(), 4);

        let metas = registry.list_all_types(TypeDescriptor::is_meta).unwrap();
        assert_eq!(metas.len(), 2);
        assert!(metas.iter().all(TypeDescriptor::is_meta));
    }

    #[test]
    fn test_member_lists_are_type_local() {
        let registry = registry();
        let base = registry.resolve_type("Base").unwrap().unwrap();
        let derived = registry.resolve_type("Derived").unwrap().unwrap();

        assert_eq!(registry.list_methods(&base).len(), 1);
        assert_eq!(registry.list_properties(&base).len(), 1);
        assert_eq!(registry.list_instance_variables(&base).len(), 1);
        assert!(registry.list_methods(&derived).is_empty());
        assert!(registry.list_protocols(&derived).is_empty());
        assert_eq!(registry.list_all_protocols().len(), 1);
    }

    #[test]
    fn test_tag_version() {
        let registry = registry();
        let base = registry.resolve_type("Base").unwrap().unwrap();
        registry.tag_version(&base, 5).unwrap();
        assert_eq!(registry.resolve_type("Base").unwrap().unwrap().version(), 5);
        registry.tag_version(&base, 0).unwrap();
        assert_eq!(registry.resolve_type("Base").unwrap().unwrap().version(), 0);
    }

    #[test]
    fn test_tag_version_stale_handle() {
        let registry = registry();
        let stale = TypeDescriptor::new("Ghost", None, false, 0);
        assert!(matches!(
            registry.tag_version(&stale, 1),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_snapshot_cache() {
        let catalog = Arc::new(InMemoryCatalog::new());
        TypeBuilder::new("First").register(&catalog).unwrap();
        let registry = Registry::with_config(
            Arc::clone(&catalog),
            RegistryConfig::default().with_snapshot_cache(true),
        );
        assert_eq!(registry.list_all_types_unfiltered().unwrap().len(), 2);

        TypeBuilder::new("Second").register(&catalog).unwrap();
        assert_eq!(registry.list_all_types_unfiltered().unwrap().len(), 2);

        registry.invalidate_snapshot();
        assert_eq!(registry.list_all_types_unfiltered().unwrap().len(), 4);
    }

    #[test]
    fn test_snapshot_without_cache_is_fresh() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let registry = Registry::new(Arc::clone(&catalog));
        assert!(registry.snapshot().unwrap().is_empty());
        TypeBuilder::new("Late").register(&catalog).unwrap();
        assert!(registry.snapshot().unwrap().contains("Late"));
    }
}

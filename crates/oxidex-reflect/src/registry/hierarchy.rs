//! Super-type walks.
//!
//! Super references are names, resolved through the catalog one hop at a
//! time. A healthy catalog never has cycles, but the catalog is external, so
//! every walk remembers the names it has seen and reports a repeat as
//! [`Error::CorruptHierarchy`] instead of looping.

use super::Registry;
use crate::catalog::Catalog;
use crate::descriptor::TypeDescriptor;
use crate::error::{Error, Result};
use fxhash::FxHashSet;
use log::warn;
use std::iter::FusedIterator;

/// Lazy iterator over the ancestors of a type, nearest first.
///
/// The starting type is not yielded. Iteration ends at the first type without
/// a super reference, or after yielding a single [`Error::CorruptHierarchy`].
/// A super reference naming an unregistered type also ends the walk.
pub struct Ancestors<'a, C: Catalog + ?Sized> {
    catalog: &'a C,
    origin: String,
    current: Option<TypeDescriptor>,
    seen: FxHashSet<String>,
}

impl<'a, C: Catalog + ?Sized> Ancestors<'a, C> {
    pub(crate) fn new(catalog: &'a C, ty: &TypeDescriptor) -> Self {
        let mut seen = FxHashSet::default();
        seen.insert(ty.name().to_string());
        Self {
            catalog,
            origin: ty.name().to_string(),
            current: Some(ty.clone()),
            seen,
        }
    }
}

impl<C: Catalog + ?Sized> Iterator for Ancestors<'_, C> {
    type Item = Result<TypeDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.take()?;
        let super_name = current.super_name()?;

        let Some(next) = self.catalog.super_type(&current) else {
            warn!(
                "'{}' names unregistered super-type '{super_name}'",
                current.name()
            );
            return None;
        };

        if !self.seen.insert(next.name().to_string()) {
            warn!(
                "cycle in hierarchy of '{}' at '{}'",
                self.origin,
                next.name()
            );
            return Some(Err(Error::CorruptHierarchy {
                type_name: self.origin.clone(),
                repeated: next.name().to_string(),
            }));
        }

        self.current = Some(next.clone());
        Some(Ok(next))
    }
}

impl<C: Catalog + ?Sized> FusedIterator for Ancestors<'_, C> {}

impl<C: Catalog> Registry<C> {
    /// Returns the direct super-type of `ty`, or `None` at a root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptHierarchy`] if `ty` names itself as its
    /// super-type.
    pub fn super_type(&self, ty: &TypeDescriptor) -> Result<Option<TypeDescriptor>> {
        self.ancestors(ty).next().transpose()
    }

    /// Returns a lazy iterator over the ancestors of `ty`, nearest first.
    ///
    /// # Example
    ///
    /// ```rust
    /// use oxidex_reflect::{InMemoryCatalog, Registry, TypeBuilder};
    ///
    /// let catalog = InMemoryCatalog::new();
    /// TypeBuilder::new("A").register(&catalog).unwrap();
    /// TypeBuilder::new("B").super_type("A").register(&catalog).unwrap();
    /// TypeBuilder::new("C").super_type("B").register(&catalog).unwrap();
    /// let registry = Registry::new(catalog);
    ///
    /// let c = registry.resolve_type("C").unwrap().unwrap();
    /// let names: Vec<String> = registry
    ///     .ancestors(&c)
    ///     .map(|ty| ty.unwrap().name().to_string())
    ///     .collect();
    /// assert_eq!(names, ["B", "A"]);
    /// ```
    pub fn ancestors<'a>(&'a self, ty: &TypeDescriptor) -> Ancestors<'a, C> {
        Ancestors::new(&self.catalog, ty)
    }

    /// Collects the ancestors of `ty`, nearest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptHierarchy`] if the chain contains a cycle.
    pub fn ancestor_chain(&self, ty: &TypeDescriptor) -> Result<Vec<TypeDescriptor>> {
        self.ancestors(ty).collect()
    }

    /// Returns `ty` followed by its ancestors.
    pub(crate) fn lineage<'a>(
        &'a self,
        ty: &TypeDescriptor,
    ) -> impl Iterator<Item = Result<TypeDescriptor>> + 'a {
        std::iter::once(Ok(ty.clone())).chain(self.ancestors(ty))
    }

    /// Returns `true` if `child` is `parent` or inherits from it.
    ///
    /// # Arguments
    ///
    /// * `child` - Type whose lineage is walked
    /// * `parent` - Candidate ancestor
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptHierarchy`] if `child`'s chain contains a cycle
    /// before `parent` is reached.
    pub fn is_subtype(&self, child: &TypeDescriptor, parent: &TypeDescriptor) -> Result<bool> {
        for ty in self.lineage(child) {
            if ty? == *parent {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Lists every registered type that strictly inherits from `parent`.
    ///
    /// Meta-types take part like any other type: the subtypes of a root
    /// include the meta-types, which inherit from it.
    ///
    /// # Errors
    ///
    /// Returns an error if enumeration fails or any walked chain is corrupt.
    pub fn subtypes(&self, parent: &TypeDescriptor) -> Result<Vec<TypeDescriptor>> {
        let candidates = self.list_all_types(|ty| ty != parent && !ty.is_root())?;
        let mut subtypes = Vec::new();
        for ty in candidates {
            if self.is_subtype(&ty, parent)? {
                subtypes.push(ty);
            }
        }
        Ok(subtypes)
    }
}

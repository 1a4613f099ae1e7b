//! Inheritance-aware capability queries.
//!
//! Unlike the `list_*` enumerations, which only see members declared on the
//! type itself, these queries walk the type and its ancestors. The nearest
//! declaration wins.

use super::Registry;
use crate::catalog::Catalog;
use crate::descriptor::{MemberCategory, MemberDescriptor, ProtocolDescriptor, TypeDescriptor};
use crate::error::{Error, Result};
use fxhash::FxHashSet;
use std::collections::VecDeque;

impl<C: Catalog> Registry<C> {
    /// Returns `true` if `ty` or an ancestor declares a method named
    /// `member_name`.
    ///
    /// # Arguments
    ///
    /// * `ty` - Type to start from; pass a meta-type to ask about type-level
    ///   methods
    /// * `member_name` - Selector name (`"encodeWithCoder:"`)
    ///
    /// # Example
    ///
    /// ```
    /// use oxidex_reflect::{InMemoryCatalog, Registry, TypeBuilder};
    ///
    /// let catalog = InMemoryCatalog::new();
    /// TypeBuilder::new("Base").method("init", "@@:").register(&catalog).unwrap();
    /// TypeBuilder::new("Derived").super_type("Base").register(&catalog).unwrap();
    /// let registry = Registry::new(catalog);
    ///
    /// let derived = registry.resolve_type("Derived").unwrap().unwrap();
    /// assert!(registry.responds_to(&derived, "init").unwrap());
    /// assert!(!registry.responds_to(&derived, "dealloc").unwrap());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty name and
    /// [`Error::CorruptHierarchy`] if the walk hits a cycle.
    pub fn responds_to(&self, ty: &TypeDescriptor, member_name: &str) -> Result<bool> {
        Ok(self.find_method(ty, member_name)?.is_some())
    }

    /// Finds the nearest method named `name` on `ty` or its ancestors.
    ///
    /// # Errors
    ///
    /// See [`responds_to`](Registry::responds_to).
    pub fn find_method(&self, ty: &TypeDescriptor, name: &str) -> Result<Option<MemberDescriptor>> {
        Ok(self
            .find_member(ty, name, MemberCategory::Method)?
            .map(|(_, member)| member))
    }

    /// Returns the type that provides the method `name` to `ty`.
    ///
    /// # Returns
    ///
    /// The nearest type in `ty`'s lineage declaring the method, `ty` itself
    /// included, or `None` if nothing does.
    ///
    /// # Errors
    ///
    /// See [`responds_to`](Registry::responds_to).
    pub fn method_provider(&self, ty: &TypeDescriptor, name: &str) -> Result<Option<TypeDescriptor>> {
        Ok(self
            .find_member(ty, name, MemberCategory::Method)?
            .map(|(provider, _)| provider))
    }

    /// Finds the nearest instance variable named `name` on `ty` or its
    /// ancestors.
    ///
    /// # Errors
    ///
    /// See [`responds_to`](Registry::responds_to).
    pub fn instance_variable(
        &self,
        ty: &TypeDescriptor,
        name: &str,
    ) -> Result<Option<MemberDescriptor>> {
        Ok(self
            .find_member(ty, name, MemberCategory::InstanceVariable)?
            .map(|(_, member)| member))
    }

    /// Finds a type variable: an instance variable of the meta-type of `ty`
    /// (or of `ty` itself if it already is a meta-type).
    ///
    /// Returns `None` if `ty` has no registered meta-type.
    ///
    /// # Errors
    ///
    /// See [`responds_to`](Registry::responds_to), plus
    /// [`Error::KindMismatch`] from meta-type resolution.
    pub fn class_variable(&self, ty: &TypeDescriptor, name: &str) -> Result<Option<MemberDescriptor>> {
        let meta = if ty.is_meta() {
            Some(ty.clone())
        } else {
            self.resolve_meta_type(ty)?
        };
        match meta {
            Some(meta) => self.instance_variable(&meta, name),
            None => Ok(None),
        }
    }

    fn find_member(
        &self,
        ty: &TypeDescriptor,
        name: &str,
        category: MemberCategory,
    ) -> Result<Option<(TypeDescriptor, MemberDescriptor)>> {
        if name.is_empty() {
            return Err(Error::invalid_argument("member name must not be empty"));
        }
        for step in self.lineage(ty) {
            let current = step?;
            let found = self
                .catalog
                .members(&current, category)
                .into_iter()
                .find(|member| member.name == name);
            if let Some(member) = found {
                return Ok(Some((current, member)));
            }
        }
        Ok(None)
    }

    /// Returns `true` if `ty` or an ancestor adopts `protocol`, directly or
    /// through protocol incorporation.
    ///
    /// # Example
    ///
    /// ```rust
    /// use oxidex_reflect::{InMemoryCatalog, ProtocolBuilder, Registry, TypeBuilder};
    ///
    /// let catalog = InMemoryCatalog::new();
    /// ProtocolBuilder::new("NSCoding").register(&catalog).unwrap();
    /// ProtocolBuilder::new("NSSecureCoding")
    ///     .incorporates("NSCoding")
    ///     .register(&catalog)
    ///     .unwrap();
    /// TypeBuilder::new("Document").adopts("NSSecureCoding").register(&catalog).unwrap();
    ///
    /// let registry = Registry::new(catalog);
    /// let doc = registry.resolve_type("Document").unwrap().unwrap();
    /// let coding = registry.resolve_protocol("NSCoding").unwrap().unwrap();
    /// assert!(registry.conforms_to(&doc, &coding).unwrap());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptHierarchy`] if the type walk hits a cycle.
    pub fn conforms_to(&self, ty: &TypeDescriptor, protocol: &ProtocolDescriptor) -> Result<bool> {
        for step in self.lineage(ty) {
            let current = step?;
            for adopted in self.catalog.protocols(&current) {
                if self.protocol_conforms_to(&adopted, protocol) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Returns `true` if `protocol` is `other` or incorporates it, at any depth.
    ///
    /// Incorporation is a graph, not a chain: shared and looping
    /// incorporations are visited once.
    pub fn protocol_conforms_to(
        &self,
        protocol: &ProtocolDescriptor,
        other: &ProtocolDescriptor,
    ) -> bool {
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::from([protocol.clone()]);
        seen.insert(protocol.name().to_string());

        while let Some(current) = queue.pop_front() {
            if current.name() == other.name() {
                return true;
            }
            for name in current.incorporated() {
                if name == other.name() {
                    return true;
                }
                if seen.insert(name.clone()) {
                    if let Some(next) = self.catalog.lookup_protocol(name) {
                        queue.push_back(next);
                    }
                }
            }
        }
        false
    }
}

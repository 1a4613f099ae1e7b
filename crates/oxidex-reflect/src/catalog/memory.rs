//! In-memory type catalog.
//!
//! [`InMemoryCatalog`] stores types and protocols in name-keyed tables behind
//! `RwLock`s. It is populated through [`TypeBuilder`] and [`ProtocolBuilder`],
//! which validate names, super-types and encodings before anything becomes
//! visible.
//!
//! # Meta-types
//!
//! Registering a type also registers its meta-type (unless disabled on the
//! builder). The meta-type is named with the catalog's meta suffix, reports
//! [`META_HEAD_SIZE`] as its instance size, and holds the type-level methods
//! and type variables. Its super-type is the super-type's meta-type; a root's
//! meta-type inherits from the root itself, so type-level lookups fall back to
//! the root's instance methods.
//!
//! # Example
//!
//! ```rust
//! use oxidex_reflect::catalog::{Catalog, InMemoryCatalog, TypeBuilder};
//!
//! let catalog = InMemoryCatalog::new();
//! TypeBuilder::new("Base")
//!     .method("init", "@@:")
//!     .ivar("_flags", "i")
//!     .register(&catalog)
//!     .unwrap();
//! TypeBuilder::new("Derived")
//!     .super_type("Base")
//!     .type_method("shared", "@@:")
//!     .register(&catalog)
//!     .unwrap();
//!
//! assert_eq!(catalog.count(), 4); // two types and two meta-types
//! assert!(catalog.lookup("Derived.Type").unwrap().is_meta());
//! ```

use crate::config::DEFAULT_META_SUFFIX;
use crate::descriptor::{
    META_HEAD_SIZE, MemberCategory, MemberDescriptor, MethodKind, ProtocolDescriptor,
    TypeDescriptor,
};
use crate::encoding::{
    parse_property_attributes, size_of_type, validate_signature, validate_value_type,
};
use crate::error::{Error, Result};
use fxhash::{FxHashMap, FxHashSet};
use log::{debug, trace};
use parking_lot::RwLock;

use super::Catalog;

/// One registered type and its type-local members.
struct TypeEntry {
    descriptor: TypeDescriptor,
    methods: Vec<MemberDescriptor>,
    properties: Vec<MemberDescriptor>,
    ivars: Vec<MemberDescriptor>,
    protocols: Vec<ProtocolDescriptor>,
}

impl TypeEntry {
    fn new(descriptor: TypeDescriptor) -> Self {
        Self {
            descriptor,
            methods: Vec::new(),
            properties: Vec::new(),
            ivars: Vec::new(),
            protocols: Vec::new(),
        }
    }
}

/// Registered types by name, plus their registration order.
#[derive(Default)]
struct TypeTable {
    entries: FxHashMap<String, TypeEntry>,
    order: Vec<String>,
}

impl TypeTable {
    fn get(&self, name: &str) -> Option<&TypeEntry> {
        self.entries.get(name)
    }

    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn insert(&mut self, entry: TypeEntry) {
        let name = entry.descriptor.name().to_string();
        self.order.push(name.clone());
        self.entries.insert(name, entry);
    }

    fn remove(&mut self, name: &str) -> Option<TypeEntry> {
        let entry = self.entries.remove(name)?;
        self.order.retain(|n| n != name);
        Some(entry)
    }

    /// Live entries, oldest registration first.
    fn in_order(&self) -> impl Iterator<Item = &TypeEntry> {
        self.order.iter().filter_map(|name| self.entries.get(name))
    }
}

/// A thread-safe, in-memory [`Catalog`].
///
/// Enumeration follows registration order, so a snapshot capped at an
/// earlier `count()` keeps the types that were already registered and drops
/// the newcomers.
pub struct InMemoryCatalog {
    meta_suffix: String,
    types: RwLock<TypeTable>,
    protocols: RwLock<FxHashMap<String, ProtocolDescriptor>>,
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCatalog {
    /// Creates an empty catalog using the default meta suffix (`".Type"`).
    #[must_use]
    pub fn new() -> Self {
        Self::with_meta_suffix(DEFAULT_META_SUFFIX)
    }

    /// Creates an empty catalog whose meta-types are named `<name><suffix>`.
    ///
    /// Pair it with a registry configured with the same suffix.
    #[must_use]
    pub fn with_meta_suffix(suffix: impl Into<String>) -> Self {
        Self {
            meta_suffix: suffix.into(),
            types: RwLock::new(TypeTable::default()),
            protocols: RwLock::new(FxHashMap::default()),
        }
    }

    /// Returns the meta suffix this catalog registers meta-types with.
    #[must_use]
    pub fn meta_suffix(&self) -> &str {
        &self.meta_suffix
    }

    /// Returns the number of registered types, meta-types included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    /// Returns `true` if no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.read().len() == 0
    }

    /// Removes a type and its meta-type.
    ///
    /// Subtypes are left in place with a dangling super reference, as in any
    /// catalog that tears a type down underneath its subclasses.
    pub fn unregister(&self, name: &str) -> Option<TypeDescriptor> {
        let mut types = self.types.write();
        let removed = types.remove(name)?;
        let meta_name = format!("{name}{}", self.meta_suffix);
        if types.get(&meta_name).is_some_and(|e| e.descriptor.is_meta()) {
            types.remove(&meta_name);
        }
        debug!("unregistered type '{name}'");
        Some(removed.descriptor)
    }

    fn insert(&self, entries: Vec<TypeEntry>) -> Result<()> {
        let mut types = self.types.write();
        // Checked again under the write lock: another thread may have won.
        if let Some(dup) = entries.iter().find(|e| types.contains(e.descriptor.name())) {
            return Err(Error::TypeAlreadyExists {
                name: dup.descriptor.name().to_string(),
            });
        }
        for entry in entries {
            trace!(
                "registered type '{}' (meta: {}, size: {})",
                entry.descriptor.name(),
                entry.descriptor.is_meta(),
                entry.descriptor.instance_size()
            );
            types.insert(entry);
        }
        Ok(())
    }
}

impl Catalog for InMemoryCatalog {
    fn count(&self) -> usize {
        self.types.read().len()
    }

    fn snapshot(&self, capacity: usize) -> Vec<Option<TypeDescriptor>> {
        self.types
            .read()
            .in_order()
            .take(capacity)
            .map(|entry| Some(entry.descriptor.clone()))
            .collect()
    }

    fn lookup(&self, name: &str) -> Option<TypeDescriptor> {
        self.types.read().get(name).map(|e| e.descriptor.clone())
    }

    fn super_type(&self, ty: &TypeDescriptor) -> Option<TypeDescriptor> {
        self.lookup(ty.super_name()?)
    }

    fn members(&self, ty: &TypeDescriptor, category: MemberCategory) -> Vec<MemberDescriptor> {
        let types = self.types.read();
        let Some(entry) = types.get(ty.name()) else {
            return Vec::new();
        };
        match category {
            MemberCategory::Method => entry.methods.clone(),
            MemberCategory::Property => entry.properties.clone(),
            MemberCategory::InstanceVariable => entry.ivars.clone(),
        }
    }

    fn protocols(&self, ty: &TypeDescriptor) -> Vec<ProtocolDescriptor> {
        self.types
            .read()
            .get(ty.name())
            .map(|e| e.protocols.clone())
            .unwrap_or_default()
    }

    fn lookup_protocol(&self, name: &str) -> Option<ProtocolDescriptor> {
        self.protocols.read().get(name).cloned()
    }

    fn all_protocols(&self) -> Vec<ProtocolDescriptor> {
        self.protocols.read().values().cloned().collect()
    }

    fn set_version(&self, ty: &TypeDescriptor, version: i32) {
        if let Some(entry) = self.types.read().get(ty.name()) {
            entry.descriptor.store_version(version);
        }
    }
}

// ============================================================================
// Type Builder
// ============================================================================

/// Builder for registering a type in an [`InMemoryCatalog`].
///
/// Nothing is validated until [`register`](TypeBuilder::register), which either
/// publishes the type (and its meta-type) atomically or leaves the catalog
/// untouched.
#[derive(Debug, Clone)]
pub struct TypeBuilder {
    name: String,
    super_name: Option<String>,
    instance_size: Option<usize>,
    with_meta: bool,
    methods: Vec<(String, String, MethodKind)>,
    properties: Vec<(String, String)>,
    ivars: Vec<(String, String)>,
    type_vars: Vec<(String, String)>,
    protocols: Vec<String>,
}

impl TypeBuilder {
    /// Starts a root type named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            super_name: None,
            instance_size: None,
            with_meta: true,
            methods: Vec::new(),
            properties: Vec::new(),
            ivars: Vec::new(),
            type_vars: Vec::new(),
            protocols: Vec::new(),
        }
    }

    /// Sets the super-type. It must already be registered.
    #[must_use]
    pub fn super_type(mut self, name: impl Into<String>) -> Self {
        self.super_name = Some(name.into());
        self
    }

    /// Sets an explicit instance size. It must cover every instance variable.
    #[must_use]
    pub fn instance_size(mut self, size: usize) -> Self {
        self.instance_size = Some(size);
        self
    }

    /// Skips registering a meta-type. Type-level methods then stay on the
    /// type itself.
    #[must_use]
    pub fn without_meta(mut self) -> Self {
        self.with_meta = false;
        self
    }

    /// Adds an instance method.
    #[must_use]
    pub fn method(mut self, name: impl Into<String>, signature: impl Into<String>) -> Self {
        self.methods
            .push((name.into(), signature.into(), MethodKind::Instance));
        self
    }

    /// Adds a type-level method.
    #[must_use]
    pub fn type_method(mut self, name: impl Into<String>, signature: impl Into<String>) -> Self {
        self.methods
            .push((name.into(), signature.into(), MethodKind::TypeLevel));
        self
    }

    /// Adds a property from its attribute string (`T@"NSString",C,N`).
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, attributes: impl Into<String>) -> Self {
        self.properties.push((name.into(), attributes.into()));
        self
    }

    /// Adds an instance variable with a single-character type encoding.
    #[must_use]
    pub fn ivar(mut self, name: impl Into<String>, type_encoding: impl Into<String>) -> Self {
        self.ivars.push((name.into(), type_encoding.into()));
        self
    }

    /// Adds a type variable, stored on the meta-type.
    #[must_use]
    pub fn type_var(mut self, name: impl Into<String>, type_encoding: impl Into<String>) -> Self {
        self.type_vars.push((name.into(), type_encoding.into()));
        self
    }

    /// Adopts a registered protocol.
    #[must_use]
    pub fn adopts(mut self, protocol: impl Into<String>) -> Self {
        self.protocols.push(protocol.into());
        self
    }

    /// Validates the type and publishes it in `catalog`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for an empty name, an unregistered
    ///   super-type or protocol, duplicate member names, or an instance size
    ///   too small for the instance variables
    /// - [`Error::TypeAlreadyExists`] if the name (or the meta-type name) is taken
    /// - [`Error::InvalidEncoding`] for a bad signature, ivar type or property
    ///   attribute string
    pub fn register(self, catalog: &InMemoryCatalog) -> Result<TypeDescriptor> {
        if self.name.is_empty() {
            return Err(Error::invalid_argument("type name must not be empty"));
        }
        if catalog.lookup(&self.name).is_some() {
            return Err(Error::TypeAlreadyExists { name: self.name });
        }

        let base_size = match &self.super_name {
            Some(super_name) => catalog
                .lookup(super_name)
                .filter(|s| !s.is_meta())
                .map(|s| s.instance_size())
                .ok_or_else(|| {
                    Error::invalid_argument(format!("super-type '{super_name}' is not registered"))
                })?,
            None => 0,
        };

        let protocols = self
            .protocols
            .iter()
            .map(|name| {
                catalog.lookup_protocol(name).ok_or_else(|| {
                    Error::invalid_argument(format!("protocol '{name}' is not registered"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let (ivars, ivar_end) = layout_variables(&self.name, &self.ivars, base_size)?;
        let instance_size = match self.instance_size {
            Some(size) if size < ivar_end => {
                return Err(Error::invalid_argument(format!(
                    "instance size {size} of '{}' is smaller than its variables ({ivar_end})",
                    self.name
                )));
            }
            Some(size) => size,
            None => align_up(ivar_end, size_of::<usize>()),
        };

        let mut instance_methods = Vec::new();
        let mut type_methods = Vec::new();
        for (name, signature, kind) in &self.methods {
            validate_signature(signature)?;
            let owner = match kind {
                MethodKind::Instance => &mut instance_methods,
                MethodKind::TypeLevel => &mut type_methods,
            };
            owner.push(MemberDescriptor::method(&self.name, name, signature, *kind));
        }
        ensure_unique(&self.name, &instance_methods)?;
        ensure_unique(&self.name, &type_methods)?;

        let properties = self
            .properties
            .iter()
            .map(|(name, attrs)| {
                Ok(MemberDescriptor::property(
                    &self.name,
                    name,
                    parse_property_attributes(attrs)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        ensure_unique(&self.name, &properties)?;

        let descriptor = TypeDescriptor::new(
            self.name.clone(),
            self.super_name.as_deref(),
            false,
            instance_size,
        );
        let mut entry = TypeEntry::new(descriptor.clone());
        entry.properties = properties;
        entry.ivars = ivars;
        entry.protocols = protocols;

        let mut entries = Vec::with_capacity(2);
        if self.with_meta {
            let meta_name = format!("{}{}", self.name, catalog.meta_suffix());
            let meta_super = match &self.super_name {
                Some(super_name) => format!("{super_name}{}", catalog.meta_suffix()),
                None => self.name.clone(),
            };
            let (type_vars, _) = layout_variables(&meta_name, &self.type_vars, 0)?;
            let mut meta = TypeEntry::new(TypeDescriptor::new(
                meta_name.clone(),
                Some(meta_super.as_str()),
                true,
                META_HEAD_SIZE,
            ));
            meta.methods = type_methods
                .into_iter()
                .map(|m| MemberDescriptor { owning_type: meta_name.clone(), ..m })
                .collect();
            meta.ivars = type_vars;
            entry.methods = instance_methods;
            entries.push(entry);
            entries.push(meta);
        } else {
            if !self.type_vars.is_empty() {
                return Err(Error::invalid_argument(format!(
                    "type variables of '{}' need a meta-type",
                    self.name
                )));
            }
            instance_methods.extend(type_methods);
            entry.methods = instance_methods;
            entries.push(entry);
        }

        catalog.insert(entries)?;
        debug!("registered type '{}'", descriptor.name());
        Ok(descriptor)
    }
}

/// Lays out variables after `start`, aligning each to its own size.
///
/// Returns the descriptors and the end offset.
fn layout_variables(
    owner: &str,
    vars: &[(String, String)],
    start: usize,
) -> Result<(Vec<MemberDescriptor>, usize)> {
    let mut offset = start;
    let mut out = Vec::with_capacity(vars.len());
    for (name, encoding) in vars {
        validate_value_type(encoding)?;
        let size = encoding
            .chars()
            .next()
            .and_then(size_of_type)
            .ok_or_else(|| Error::invalid_encoding(encoding))?;
        offset = align_up(offset, size.max(1));
        out.push(MemberDescriptor::instance_variable(owner, name, encoding, offset));
        offset += size;
    }
    ensure_unique(owner, &out)?;
    Ok((out, offset))
}

fn align_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

fn ensure_unique(owner: &str, members: &[MemberDescriptor]) -> Result<()> {
    let mut seen = FxHashSet::default();
    for member in members {
        if !seen.insert(member.name.as_str()) {
            return Err(Error::invalid_argument(format!(
                "duplicate member '{}' on '{owner}'",
                member.name
            )));
        }
    }
    Ok(())
}

// ============================================================================
// Protocol Builder
// ============================================================================

/// Builder for registering a protocol in an [`InMemoryCatalog`].
#[derive(Debug, Clone)]
pub struct ProtocolBuilder {
    name: String,
    required: Vec<(String, String, MethodKind)>,
    optional: Vec<(String, String, MethodKind)>,
    incorporated: Vec<String>,
}

impl ProtocolBuilder {
    /// Starts a protocol named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: Vec::new(),
            optional: Vec::new(),
            incorporated: Vec::new(),
        }
    }

    /// Adds a required instance method.
    #[must_use]
    pub fn required(mut self, name: impl Into<String>, signature: impl Into<String>) -> Self {
        self.required
            .push((name.into(), signature.into(), MethodKind::Instance));
        self
    }

    /// Adds a required type-level method.
    #[must_use]
    pub fn required_type_method(
        mut self,
        name: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        self.required
            .push((name.into(), signature.into(), MethodKind::TypeLevel));
        self
    }

    /// Adds an optional instance method.
    #[must_use]
    pub fn optional(mut self, name: impl Into<String>, signature: impl Into<String>) -> Self {
        self.optional
            .push((name.into(), signature.into(), MethodKind::Instance));
        self
    }

    /// Incorporates an already registered protocol.
    #[must_use]
    pub fn incorporates(mut self, protocol: impl Into<String>) -> Self {
        self.incorporated.push(protocol.into());
        self
    }

    /// Validates the protocol and publishes it in `catalog`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for an empty name or an unregistered
    ///   incorporated protocol
    /// - [`Error::ProtocolAlreadyExists`] if the name is taken
    /// - [`Error::InvalidEncoding`] for a bad member signature
    pub fn register(self, catalog: &InMemoryCatalog) -> Result<ProtocolDescriptor> {
        if self.name.is_empty() {
            return Err(Error::invalid_argument("protocol name must not be empty"));
        }
        for name in &self.incorporated {
            if catalog.lookup_protocol(name).is_none() {
                return Err(Error::invalid_argument(format!(
                    "incorporated protocol '{name}' is not registered"
                )));
            }
        }

        let build = |members: &[(String, String, MethodKind)]| {
            members
                .iter()
                .map(|(name, signature, kind)| {
                    validate_signature(signature)?;
                    Ok(MemberDescriptor::method(&self.name, name, signature, *kind))
                })
                .collect::<Result<Vec<_>>>()
        };
        let required = build(&self.required)?;
        let optional = build(&self.optional)?;

        let protocol =
            ProtocolDescriptor::new(self.name.clone(), required, optional, self.incorporated);

        let mut protocols = catalog.protocols.write();
        if protocols.contains_key(&self.name) {
            return Err(Error::ProtocolAlreadyExists { name: self.name });
        }
        protocols.insert(self.name, protocol.clone());
        debug!("registered protocol '{}'", protocol.name());
        Ok(protocol)
    }
}

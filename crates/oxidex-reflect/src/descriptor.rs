//! Descriptors for types, members and protocols.
//!
//! Descriptors are handles onto catalog entries. Cloning one is a reference
//! count bump; the catalog stays the owner of the underlying data. Apart from
//! the version tag, a descriptor never changes after the catalog creates it.
//!
//! References between descriptors are by name: a type knows the *name* of its
//! super-type, a member knows the *name* of its owner, and a protocol knows the
//! *names* of the protocols it incorporates. Resolving those names always goes
//! back through the catalog.

use crate::encoding::{PropertyAttribute, format_property_attributes};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

/// Head size of a type object, reported as the instance size of meta-types.
///
/// Matches the layout of a class object: isa, superclass, cache (two words)
/// and the data pointer.
pub const META_HEAD_SIZE: usize = 5 * size_of::<usize>();

// ============================================================================
// Types
// ============================================================================

struct TypeInner {
    name: String,
    super_name: Option<String>,
    is_meta: bool,
    instance_size: usize,
    version: AtomicI32,
}

/// A registered type (class or meta-class).
///
/// # Equality
///
/// Two descriptors are equal when they have the same name and meta flag.
/// Names are unique in a catalog, so this is identity for live entries.
///
/// # Example
///
/// ```rust
/// use oxidex_reflect::TypeDescriptor;
///
/// let base = TypeDescriptor::new("Base", None, false, 8);
/// let derived = TypeDescriptor::new("Derived", Some("Base"), false, 16);
///
/// assert!(base.is_root());
/// assert_eq!(derived.super_name(), Some("Base"));
/// assert_eq!(derived.version(), 0);
/// ```
#[derive(Clone)]
pub struct TypeDescriptor {
    inner: Arc<TypeInner>,
}

impl TypeDescriptor {
    /// Creates a descriptor. Catalog implementations call this when a type is
    /// registered; the version tag starts at 0.
    pub fn new(
        name: impl Into<String>,
        super_name: Option<&str>,
        is_meta: bool,
        instance_size: usize,
    ) -> Self {
        Self {
            inner: Arc::new(TypeInner {
                name: name.into(),
                super_name: super_name.map(str::to_string),
                is_meta,
                instance_size,
                version: AtomicI32::new(0),
            }),
        }
    }

    /// Returns the type's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the name of the super-type, or `None` for a root.
    #[must_use]
    pub fn super_name(&self) -> Option<&str> {
        self.inner.super_name.as_deref()
    }

    /// Returns `true` if the type has no super-type.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.inner.super_name.is_none()
    }

    /// Returns `true` for meta-types.
    #[must_use]
    pub fn is_meta(&self) -> bool {
        self.inner.is_meta
    }

    /// Returns the instance size in bytes.
    ///
    /// Meta-types report [`META_HEAD_SIZE`].
    #[must_use]
    pub fn instance_size(&self) -> usize {
        self.inner.instance_size
    }

    /// Returns the current version tag.
    #[must_use]
    pub fn version(&self) -> i32 {
        self.inner.version.load(Ordering::Acquire)
    }

    /// Stores a new version tag.
    ///
    /// This is the write half of [`Catalog::set_version`](crate::Catalog::set_version)
    /// for catalogs that keep the tag on the descriptor. Callers should go
    /// through [`Registry::tag_version`](crate::Registry::tag_version).
    pub fn store_version(&self, version: i32) {
        self.inner.version.store(version, Ordering::Release);
    }

    /// Returns `true` if both handles point at the same catalog entry.
    #[must_use]
    pub fn ptr_eq(&self, other: &TypeDescriptor) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.inner.is_meta == other.inner.is_meta && self.inner.name == other.inner.name
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.name.hash(state);
        self.inner.is_meta.hash(state);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.inner.name)
            .field("super_name", &self.inner.super_name)
            .field("is_meta", &self.inner.is_meta)
            .field("instance_size", &self.inner.instance_size)
            .field("version", &self.version())
            .finish()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.name)
    }
}

// ============================================================================
// Members
// ============================================================================

/// Whether a method belongs to instances or to the type itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// Instance method (`-method`).
    Instance,
    /// Type-level method (`+method`).
    TypeLevel,
}

/// Selects one of a type's member sub-collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberCategory {
    /// Methods of either kind.
    Method,
    /// Declared properties.
    Property,
    /// Instance variables.
    InstanceVariable,
}

/// Variant-specific data of a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKind {
    /// A method.
    Method {
        /// Instance or type-level.
        kind: MethodKind,
    },
    /// A declared property.
    Property {
        /// Ordered attribute list.
        attributes: Vec<PropertyAttribute>,
    },
    /// An instance variable.
    InstanceVariable {
        /// Byte offset from the start of the instance.
        offset: usize,
    },
}

/// A method, property or instance variable of a type (or protocol).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDescriptor {
    /// Name of the owning type or protocol.
    pub owning_type: String,
    /// Member name (selector name for methods).
    pub name: String,
    /// Opaque signature or type encoding.
    pub signature: String,
    /// Variant-specific data.
    pub kind: MemberKind,
}

impl MemberDescriptor {
    /// Creates a method descriptor.
    pub fn method(
        owning_type: impl Into<String>,
        name: impl Into<String>,
        signature: impl Into<String>,
        kind: MethodKind,
    ) -> Self {
        Self {
            owning_type: owning_type.into(),
            name: name.into(),
            signature: signature.into(),
            kind: MemberKind::Method { kind },
        }
    }

    /// Creates a property descriptor.
    ///
    /// The signature of a property is the value of its `T` attribute.
    pub fn property(
        owning_type: impl Into<String>,
        name: impl Into<String>,
        attributes: Vec<PropertyAttribute>,
    ) -> Self {
        let signature = attributes
            .iter()
            .find(|attr| attr.name == "T")
            .map(|attr| attr.value.clone())
            .unwrap_or_default();
        Self {
            owning_type: owning_type.into(),
            name: name.into(),
            signature,
            kind: MemberKind::Property { attributes },
        }
    }

    /// Creates an instance variable descriptor.
    pub fn instance_variable(
        owning_type: impl Into<String>,
        name: impl Into<String>,
        type_encoding: impl Into<String>,
        offset: usize,
    ) -> Self {
        Self {
            owning_type: owning_type.into(),
            name: name.into(),
            signature: type_encoding.into(),
            kind: MemberKind::InstanceVariable { offset },
        }
    }

    /// Returns the sub-collection this member lives in.
    #[must_use]
    pub fn category(&self) -> MemberCategory {
        match self.kind {
            MemberKind::Method { .. } => MemberCategory::Method,
            MemberKind::Property { .. } => MemberCategory::Property,
            MemberKind::InstanceVariable { .. } => MemberCategory::InstanceVariable,
        }
    }

    /// Returns the method kind, or `None` if this is not a method.
    #[must_use]
    pub fn method_kind(&self) -> Option<MethodKind> {
        match self.kind {
            MemberKind::Method { kind } => Some(kind),
            _ => None,
        }
    }

    /// Returns the property attributes (empty for non-properties).
    #[must_use]
    pub fn attributes(&self) -> &[PropertyAttribute] {
        match &self.kind {
            MemberKind::Property { attributes } => attributes,
            _ => &[],
        }
    }

    /// Returns the value of one property attribute.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes()
            .iter()
            .find(|attr| attr.name == key)
            .map(|attr| attr.value.as_str())
    }

    /// Returns the attribute string of a property, in the form the builder
    /// accepts (`T@"NSString",C,N,V_name`).
    ///
    /// # Returns
    ///
    /// `None` if this member is not a property.
    #[must_use]
    pub fn attribute_string(&self) -> Option<String> {
        match &self.kind {
            MemberKind::Property { attributes } => Some(format_property_attributes(attributes)),
            _ => None,
        }
    }

    /// Returns the instance variable offset, or `None` if this is not an ivar.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        match self.kind {
            MemberKind::InstanceVariable { offset } => Some(offset),
            _ => None,
        }
    }
}

// ============================================================================
// Protocols
// ============================================================================

struct ProtocolInner {
    name: String,
    required: Vec<MemberDescriptor>,
    optional: Vec<MemberDescriptor>,
    incorporated: Vec<String>,
}

/// A protocol: a named set of required and optional members.
///
/// Protocols may incorporate other protocols; those are held by name, so an
/// incorporated protocol exists independently of the one that names it.
#[derive(Clone)]
pub struct ProtocolDescriptor {
    inner: Arc<ProtocolInner>,
}

impl ProtocolDescriptor {
    /// Creates a protocol descriptor.
    pub fn new(
        name: impl Into<String>,
        required: Vec<MemberDescriptor>,
        optional: Vec<MemberDescriptor>,
        incorporated: Vec<String>,
    ) -> Self {
        Self {
            inner: Arc::new(ProtocolInner {
                name: name.into(),
                required,
                optional,
                incorporated,
            }),
        }
    }

    /// Returns the protocol's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the required members.
    #[must_use]
    pub fn required(&self) -> &[MemberDescriptor] {
        &self.inner.required
    }

    /// Returns the optional members.
    #[must_use]
    pub fn optional(&self) -> &[MemberDescriptor] {
        &self.inner.optional
    }

    /// Returns the names of directly incorporated protocols.
    #[must_use]
    pub fn incorporated(&self) -> &[String] {
        &self.inner.incorporated
    }

    /// Returns `true` if `name` is directly incorporated (not transitively).
    #[must_use]
    pub fn incorporates(&self, name: &str) -> bool {
        self.inner.incorporated.iter().any(|p| p == name)
    }
}

impl PartialEq for ProtocolDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.inner.name == other.inner.name
    }
}

impl Eq for ProtocolDescriptor {}

impl fmt::Debug for ProtocolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolDescriptor")
            .field("name", &self.inner.name)
            .field("required", &self.inner.required.len())
            .field("optional", &self.inner.optional.len())
            .field("incorporated", &self.inner.incorporated)
            .finish()
    }
}

impl fmt::Display for ProtocolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_descriptor_accessors() {
        let ty = TypeDescriptor::new("Derived", Some("Base"), false, 24);
        assert_eq!(ty.name(), "Derived");
        assert_eq!(ty.super_name(), Some("Base"));
        assert!(!ty.is_root());
        assert!(!ty.is_meta());
        assert_eq!(ty.instance_size(), 24);
        assert_eq!(ty.version(), 0);
        assert_eq!(ty.to_string(), "Derived");
    }

    #[test]
    fn test_version_shared_between_clones() {
        let ty = TypeDescriptor::new("Base", None, false, 8);
        let clone = ty.clone();
        clone.store_version(7);
        assert_eq!(ty.version(), 7);
        assert!(ty.ptr_eq(&clone));
    }

    #[test]
    fn test_type_equality_uses_name_and_meta_flag() {
        let a = TypeDescriptor::new("Base", None, false, 8);
        let b = TypeDescriptor::new("Base", None, false, 8);
        let meta = TypeDescriptor::new("Base", None, true, META_HEAD_SIZE);
        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
        assert_ne!(a, meta);
    }

    #[test]
    fn test_member_variants() {
        let method = MemberDescriptor::method("Base", "description", "@@:", MethodKind::Instance);
        assert_eq!(method.category(), MemberCategory::Method);
        assert_eq!(method.method_kind(), Some(MethodKind::Instance));
        assert!(method.attributes().is_empty());
        assert_eq!(method.offset(), None);

        let ivar = MemberDescriptor::instance_variable("Base", "_count", "q", 8);
        assert_eq!(ivar.category(), MemberCategory::InstanceVariable);
        assert_eq!(ivar.offset(), Some(8));
        assert_eq!(ivar.method_kind(), None);
    }

    #[test]
    fn test_property_signature_from_type_attribute() {
        let prop = MemberDescriptor::property(
            "Base",
            "name",
            vec![
                PropertyAttribute::new("T", "@\"NSString\""),
                PropertyAttribute::new("C", ""),
            ],
        );
        assert_eq!(prop.category(), MemberCategory::Property);
        assert_eq!(prop.signature, "@\"NSString\"");
        assert_eq!(prop.attribute("C"), Some(""));
        assert_eq!(prop.attribute("W"), None);
        assert_eq!(prop.attribute_string().as_deref(), Some("T@\"NSString\",C"));

        let ivar = MemberDescriptor::instance_variable("Base", "_flags", "i", 8);
        assert_eq!(ivar.attribute_string(), None);
    }

    #[test]
    fn test_protocol_descriptor() {
        let proto = ProtocolDescriptor::new(
            "NSSecureCoding",
            vec![MemberDescriptor::method(
                "NSSecureCoding",
                "supportsSecureCoding",
                "B@:",
                MethodKind::TypeLevel,
            )],
            Vec::new(),
            vec!["NSCoding".to_string()],
        );
        assert_eq!(proto.name(), "NSSecureCoding");
        assert_eq!(proto.required().len(), 1);
        assert!(proto.optional().is_empty());
        assert!(proto.incorporates("NSCoding"));
        assert!(!proto.incorporates("NSCopying"));
    }
}

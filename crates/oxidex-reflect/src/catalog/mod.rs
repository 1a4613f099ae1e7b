//! The catalog boundary.
//!
//! A [`Catalog`] is the external, process-wide store of type metadata. The
//! registry only ever reads it (plus the version tag write), one call at a
//! time, and never assumes two calls see the same state.
//!
//! - [`memory`]: an in-memory catalog, usable standalone and as a test fake

pub mod memory;

pub use memory::{InMemoryCatalog, ProtocolBuilder, TypeBuilder};

use crate::descriptor::{MemberCategory, MemberDescriptor, ProtocolDescriptor, TypeDescriptor};
use std::sync::Arc;

/// Read interface onto a type catalog.
///
/// Implementations must be safe to call from several threads at once.
/// Registrations may change between any two calls; the registry tolerates
/// this where documented and otherwise reports corruption.
pub trait Catalog: Send + Sync {
    /// Returns the current number of live type registrations.
    fn count(&self) -> usize;

    /// Fills up to `capacity` slots with live types.
    ///
    /// A slot may be `None` if its type was unregistered while the snapshot
    /// was being taken. Returning more than `capacity` slots is a contract
    /// violation.
    fn snapshot(&self, capacity: usize) -> Vec<Option<TypeDescriptor>>;

    /// Looks up a type by exact name.
    fn lookup(&self, name: &str) -> Option<TypeDescriptor>;

    /// Returns the super-type of `ty`, or `None` at a root or if the super
    /// reference is dangling.
    fn super_type(&self, ty: &TypeDescriptor) -> Option<TypeDescriptor>;

    /// Returns the type-local members of one category, in declaration order.
    fn members(&self, ty: &TypeDescriptor, category: MemberCategory) -> Vec<MemberDescriptor>;

    /// Returns the protocols `ty` adopts directly.
    fn protocols(&self, ty: &TypeDescriptor) -> Vec<ProtocolDescriptor>;

    /// Looks up a protocol by exact name.
    fn lookup_protocol(&self, name: &str) -> Option<ProtocolDescriptor>;

    /// Returns every registered protocol.
    fn all_protocols(&self) -> Vec<ProtocolDescriptor>;

    /// Overwrites the version tag of `ty`.
    fn set_version(&self, ty: &TypeDescriptor, version: i32);
}

impl<C: Catalog + ?Sized> Catalog for Arc<C> {
    fn count(&self) -> usize {
        (**self).count()
    }

    fn snapshot(&self, capacity: usize) -> Vec<Option<TypeDescriptor>> {
        (**self).snapshot(capacity)
    }

    fn lookup(&self, name: &str) -> Option<TypeDescriptor> {
        (**self).lookup(name)
    }

    fn super_type(&self, ty: &TypeDescriptor) -> Option<TypeDescriptor> {
        (**self).super_type(ty)
    }

    fn members(&self, ty: &TypeDescriptor, category: MemberCategory) -> Vec<MemberDescriptor> {
        (**self).members(ty, category)
    }

    fn protocols(&self, ty: &TypeDescriptor) -> Vec<ProtocolDescriptor> {
        (**self).protocols(ty)
    }

    fn lookup_protocol(&self, name: &str) -> Option<ProtocolDescriptor> {
        (**self).lookup_protocol(name)
    }

    fn all_protocols(&self) -> Vec<ProtocolDescriptor> {
        (**self).all_protocols()
    }

    fn set_version(&self, ty: &TypeDescriptor, version: i32) {
        (**self).set_version(ty, version);
    }
}

//! Read-only type snapshots.
//!
//! A [`Snapshot`] is the result of one two-phase enumeration, indexed by name.
//! The registry can keep the most recent one in a [`SnapshotCache`] until it
//! is told to drop it.

use crate::descriptor::TypeDescriptor;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// An immutable view of the types that were live during one enumeration.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    types: Vec<TypeDescriptor>,
    index: FxHashMap<String, usize>,
}

impl Snapshot {
    pub(crate) fn new(types: Vec<TypeDescriptor>) -> Self {
        let index = types
            .iter()
            .enumerate()
            .map(|(idx, ty)| (ty.name().to_string(), idx))
            .collect();
        Self { types, index }
    }

    /// Returns every type in the snapshot, in enumeration order.
    #[must_use]
    pub fn types(&self) -> &[TypeDescriptor] {
        &self.types
    }

    /// Looks up a type by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.index.get(name).map(|&idx| &self.types[idx])
    }

    /// Returns `true` if the snapshot contains `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the number of types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates over the type names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(TypeDescriptor::name)
    }
}

/// Holds at most one snapshot until invalidated.
#[derive(Debug, Default)]
pub(crate) struct SnapshotCache {
    slot: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotCache {
    pub(crate) fn get(&self) -> Option<Arc<Snapshot>> {
        self.slot.read().clone()
    }

    pub(crate) fn store(&self, snapshot: Arc<Snapshot>) {
        *self.slot.write() = Some(snapshot);
    }

    pub(crate) fn invalidate(&self) -> bool {
        self.slot.write().take().is_some()
    }
}

// Common fixtures for integration tests
//
// Shared catalogs and helpers used across the integration test files.

#![allow(dead_code)]

use fxhash::{FxHashMap, FxHashSet};
use oxidex_reflect::{
    Catalog, InMemoryCatalog, MemberCategory, MemberDescriptor, ProtocolBuilder,
    ProtocolDescriptor, Registry, TypeBuilder, TypeDescriptor,
};
use std::sync::atomic::{AtomicUsize, Ordering};

static FIXTURE_ID: AtomicUsize = AtomicUsize::new(0);

/// Routes `log` output through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Returns a name no other test in this binary uses.
pub fn unique_name(prefix: &str) -> String {
    let id = FIXTURE_ID.fetch_add(1, Ordering::SeqCst);
    format!("{prefix}_{id}")
}

/// Catalog with `Base` (root) and `Derived` (super = `Base`), plus a small
/// protocol family.
pub fn scenario_catalog() -> InMemoryCatalog {
    let catalog = InMemoryCatalog::new();
    ProtocolBuilder::new("NSCoding")
        .required("encodeWithCoder:", "v@:@")
        .required("initWithCoder:", "@@:@")
        .register(&catalog)
        .expect("Failed to register NSCoding");
    ProtocolBuilder::new("NSSecureCoding")
        .incorporates("NSCoding")
        .required_type_method("supportsSecureCoding", "B@:")
        .register(&catalog)
        .expect("Failed to register NSSecureCoding");
    ProtocolBuilder::new("NSCopying")
        .required("copyWithZone:", "@@:^")
        .register(&catalog)
        .expect("Failed to register NSCopying");

    TypeBuilder::new("Base")
        .method("init", "@@:")
        .method("description", "@@:")
        .type_method("new", "@@:")
        .ivar("_flags", "i")
        .property("identifier", "Tq,R,N,V_identifier")
        .register(&catalog)
        .expect("Failed to register Base");
    TypeBuilder::new("Derived")
        .super_type("Base")
        .method("encodeWithCoder:", "v@:@")
        .ivar("_name", "@")
        .property("name", "T@\"NSString\",C,N,V_name")
        .adopts("NSSecureCoding")
        .register(&catalog)
        .expect("Failed to register Derived");
    catalog
}

pub fn scenario_registry() -> Registry<InMemoryCatalog> {
    init_logging();
    Registry::new(scenario_catalog())
}

pub fn resolve<C: Catalog>(registry: &Registry<C>, name: &str) -> TypeDescriptor {
    registry
        .resolve_type(name)
        .expect("resolve_type failed")
        .unwrap_or_else(|| panic!("type '{name}' not registered"))
}

pub fn names(types: &[TypeDescriptor]) -> FxHashSet<String> {
    types.iter().map(|ty| ty.name().to_string()).collect()
}

/// A hand-scripted catalog for failure modes the in-memory catalog cannot
/// produce: cycles, slots vanishing mid-enumeration, and over-filled snapshots.
#[derive(Default)]
pub struct ScriptedCatalog {
    types: Vec<TypeDescriptor>,
    absent_slots: FxHashSet<usize>,
    overfill: usize,
    adopted: FxHashMap<String, Vec<ProtocolDescriptor>>,
    protocols: Vec<ProtocolDescriptor>,
}

impl ScriptedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a type without checking that its super-type exists.
    pub fn with_type(mut self, name: &str, super_name: Option<&str>) -> Self {
        self.types
            .push(TypeDescriptor::new(name, super_name, false, 8));
        self
    }

    /// Reports the slot at `index` as unregistered during enumeration.
    pub fn with_absent_slot(mut self, index: usize) -> Self {
        self.absent_slots.insert(index);
        self
    }

    /// Returns `extra` more slots than requested.
    pub fn with_overfill(mut self, extra: usize) -> Self {
        self.overfill = extra;
        self
    }

    pub fn with_protocol(mut self, protocol: ProtocolDescriptor) -> Self {
        self.protocols.push(protocol);
        self
    }

    pub fn with_adoption(mut self, type_name: &str, protocol: ProtocolDescriptor) -> Self {
        self.adopted
            .entry(type_name.to_string())
            .or_default()
            .push(protocol);
        self
    }
}

impl Catalog for ScriptedCatalog {
    fn count(&self) -> usize {
        self.types.len()
    }

    fn snapshot(&self, capacity: usize) -> Vec<Option<TypeDescriptor>> {
        let mut slots: Vec<Option<TypeDescriptor>> = self
            .types
            .iter()
            .enumerate()
            .take(capacity)
            .map(|(idx, ty)| (!self.absent_slots.contains(&idx)).then(|| ty.clone()))
            .collect();
        slots.extend(std::iter::repeat_n(None, self.overfill));
        slots
    }

    fn lookup(&self, name: &str) -> Option<TypeDescriptor> {
        self.types.iter().find(|ty| ty.name() == name).cloned()
    }

    fn super_type(&self, ty: &TypeDescriptor) -> Option<TypeDescriptor> {
        self.lookup(ty.super_name()?)
    }

    fn members(&self, _ty: &TypeDescriptor, _category: MemberCategory) -> Vec<MemberDescriptor> {
        Vec::new()
    }

    fn protocols(&self, ty: &TypeDescriptor) -> Vec<ProtocolDescriptor> {
        self.adopted.get(ty.name()).cloned().unwrap_or_default()
    }

    fn lookup_protocol(&self, name: &str) -> Option<ProtocolDescriptor> {
        self.protocols.iter().find(|p| p.name() == name).cloned()
    }

    fn all_protocols(&self) -> Vec<ProtocolDescriptor> {
        self.protocols.clone()
    }

    fn set_version(&self, ty: &TypeDescriptor, version: i32) {
        if let Some(live) = self.lookup(ty.name()) {
            live.store_version(version);
        }
    }
}

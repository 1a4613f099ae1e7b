//! `OxideX` Reflect: a read-only reflective registry for Objective-C style
//! type catalogs.
//!
//! The registry answers the questions a dynamic runtime's introspection API
//! answers: which types exist, what a type inherits from, which methods,
//! properties, instance variables and protocols it declares, and whether it
//! responds to a method or conforms to a protocol.
//!
//! # Architecture
//!
//! - [`Catalog`]: the external store of type metadata. The registry never owns
//!   descriptors; it queries the catalog through this trait.
//! - [`InMemoryCatalog`]: a thread-safe catalog populated with
//!   [`TypeBuilder`] and [`ProtocolBuilder`].
//! - [`Registry`]: resolution, two-phase enumeration, hierarchy walks,
//!   conformance queries and version tagging.
//! - [`encoding`]: method signature and property attribute encodings.
//!
//! Lookups that find nothing return `Ok(None)`. Errors are reserved for bad
//! arguments and catalog corruption (see [`Error`]).
//!
//! # Example
//!
//! ```rust
//! use oxidex_reflect::{InMemoryCatalog, ProtocolBuilder, Registry, TypeBuilder};
//!
//! let catalog = InMemoryCatalog::new();
//! ProtocolBuilder::new("NSCopying")
//!     .required("copyWithZone:", "@@:^")
//!     .register(&catalog)
//!     .unwrap();
//! TypeBuilder::new("Base")
//!     .method("init", "@@:")
//!     .register(&catalog)
//!     .unwrap();
//! TypeBuilder::new("Derived")
//!     .super_type("Base")
//!     .adopts("NSCopying")
//!     .register(&catalog)
//!     .unwrap();
//!
//! let registry = Registry::new(catalog);
//! let derived = registry.resolve_type("Derived").unwrap().unwrap();
//!
//! let chain: Vec<_> = registry.ancestor_chain(&derived).unwrap();
//! assert_eq!(chain[0].name(), "Base");
//! assert!(registry.responds_to(&derived, "init").unwrap());
//!
//! let copying = registry.resolve_protocol("NSCopying").unwrap().unwrap();
//! assert!(registry.conforms_to(&derived, &copying).unwrap());
//! ```

pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod encoding;
pub mod error;
pub mod registry;

pub use catalog::{Catalog, InMemoryCatalog, ProtocolBuilder, TypeBuilder};
pub use config::RegistryConfig;
pub use descriptor::{
    META_HEAD_SIZE, MemberCategory, MemberDescriptor, MemberKind, MethodKind, ProtocolDescriptor,
    TypeDescriptor,
};
pub use encoding::PropertyAttribute;
pub use error::{Error, Result};
pub use registry::{Ancestors, Registry, Snapshot};

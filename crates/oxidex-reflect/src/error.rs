//! Error types for the `OxideX` reflection registry.
//!
//! "Not found" is never an error here: lookups return `Ok(None)` or an empty
//! collection. Errors are reserved for bad arguments, catalog corruption, and
//! failures while populating the in-memory catalog.

use thiserror::Error;

/// Errors that can occur while querying or populating a type catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An empty name or a stale descriptor was passed where a live one was required.
    #[error("Invalid argument: {reason}")]
    InvalidArgument {
        /// Human-readable reason.
        reason: String,
    },

    /// A super-type walk revisited a type it had already seen.
    #[error("Corrupt hierarchy: '{repeated}' repeats in the ancestor chain of '{type_name}'")]
    CorruptHierarchy {
        /// The type the walk started from.
        type_name: String,
        /// The name that was seen twice.
        repeated: String,
    },

    /// The catalog returned more slots than it was asked for.
    #[error("Inconsistent catalog: requested {requested} slots, catalog returned {returned}")]
    InconsistentCatalog {
        /// Capacity passed to the catalog.
        requested: usize,
        /// Number of slots actually returned.
        returned: usize,
    },

    /// A name resolved, but to a descriptor of the wrong kind.
    #[error("Kind mismatch: '{name}' is registered but is not a {expected}")]
    KindMismatch {
        /// The resolved name.
        name: String,
        /// What the caller expected to find.
        expected: &'static str,
    },

    /// Type name already exists in the catalog.
    #[error("Type '{name}' already exists in catalog")]
    TypeAlreadyExists {
        /// The duplicate name.
        name: String,
    },

    /// Protocol name already exists in the catalog.
    #[error("Protocol '{name}' already exists in catalog")]
    ProtocolAlreadyExists {
        /// The duplicate name.
        name: String,
    },

    /// Invalid signature or property attribute encoding.
    #[error("Invalid encoding: {encoding:?}")]
    InvalidEncoding {
        /// The offending encoding string.
        encoding: String,
    },
}

impl Error {
    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_encoding(encoding: &str) -> Self {
        Error::InvalidEncoding {
            encoding: encoding.to_string(),
        }
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, Error>;

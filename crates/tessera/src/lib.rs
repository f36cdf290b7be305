//! Tessera: grouped numerical arrays for discretized domains.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Tessera sub-crates. For most users, adding `tessera` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use tessera::prelude::*;
//!
//! let backend = Arc::new(HostBackend::default());
//! let groups = [
//!     HostBuffer::from_f64(&[3, 2], (0..6u32).map(f64::from).collect()).unwrap(),
//!     HostBuffer::from_f64(&[2, 3], (6..12u32).map(f64::from).collect()).unwrap(),
//! ];
//! let mut x = GroupedArray::attached(backend.clone(), groups).unwrap();
//! x.mul_in_place(2.0).unwrap();
//!
//! let registry = Registry::with_builtins();
//! let traversal = Traversal::new(&registry);
//! let flat = flatten(&traversal, &Node::Array(x.clone())).unwrap();
//! assert_eq!(flat.as_leaf().unwrap().size(), 12);
//!
//! let shapes = group_shapes_of(&x).unwrap();
//! let back = unflatten(&traversal, backend.clone(), &shapes, &flat).unwrap();
//! assert_eq!(back.as_array().unwrap()[1], x[1]);
//!
//! let persisted = with_persist_context(backend, |_| persist(&x)).unwrap().unwrap();
//! assert_eq!(persisted.len(), 2);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tessera-core` | Backend contract, dtypes, shapes, errors |
//! | [`array`] | `tessera-array` | `GroupedArray`, container registry, traversal |
//! | [`layout`] | `tessera-layout` | Flatten/unflatten and group shapes |
//! | [`persist`] | `tessera-persist` | Persistence context, persist/restore, binary codec |
//! | [`host`] | `tessera-host` | In-memory reference backend |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Backend contract, dtypes, shapes, and errors (`tessera-core`).
pub use tessera_core as types;

/// Grouped arrays, the container registry, and traversal (`tessera-array`).
///
/// Register user containers with [`array::RegistryBuilder`] and walk them
/// with [`array::Traversal`].
pub use tessera_array as array;

/// Flatten/unflatten layout codec (`tessera-layout`).
pub use tessera_layout as layout;

/// Thread-scoped persistence and the binary codec (`tessera-persist`).
pub use tessera_persist as persist;

/// In-memory reference backend (`tessera-host`).
pub use tessera_host as host;

/// Common imports for typical Tessera usage.
///
/// ```rust
/// use tessera::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use tessera_core::{
        Backend, BinaryOp, BufferMeta, DType, GroupShape, HostArray, HostData, Scalar,
    };

    // Errors
    pub use tessera_core::{ArrayError, BackendError};

    // Containers and traversal
    pub use tessera_array::{
        ArrayContainer, Composite, GroupedArray, Node, ObjectArray, Registry, RegistryBuilder,
        Traversal,
    };

    // Layout
    pub use tessera_layout::{
        flatten, group_shapes, group_shapes_of, unflatten, Discretization, ElementGroupInfo,
    };

    // Persistence
    pub use tessera_persist::{
        persist, restore, with_persist_context, PersistGuard, PersistedGroups,
    };

    // Host backend
    pub use tessera_host::{HostBackend, HostBuffer, HostConfig};
}

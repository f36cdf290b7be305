//! Grouped arrays, the container registry, and generic traversal.
//!
//! # Architecture
//!
//! ```text
//! Node<B> (closed variant)
//! ├── Array(GroupedArray<B>)   one buffer per group, optional backend
//! ├── Composite(Composite<B>)  any registered ArrayContainer, type-erased
//! └── Leaf(B::Buffer)          opaque buffer (e.g. a flattened array)
//!
//! Registry<B>  TypeId → (decompose, recompose), built once at startup
//! Traversal    recursion over Node using the registry
//! ```
//!
//! A [`GroupedArray`] is the base case of every traversal: the engine
//! never descends into its buffers as if they were containers. Composites
//! are opened through the [`Registry`], rebuilt child by child, and
//! recomposed into the same container type.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod container;
pub mod grouped;
pub mod node;
pub mod registry;
pub mod traverse;

pub use container::{assemble_indexed, ArrayContainer, ObjectArray};
pub use grouped::{GroupedArray, Operand};
pub use node::{Composite, Node};
pub use registry::{Registry, RegistryBuilder};
pub use traverse::{mapped, multimapped, Traversal};

//! Core types and traits for Tessera grouped arrays.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other crate in the workspace: the
//! [`Backend`] capability contract, element types, the canonical
//! host-side array form, group shapes, and the error taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod dtype;
pub mod error;
pub mod host;
pub mod op;
pub mod shape;

pub use backend::{Backend, BufferMeta, BufferOperand};
pub use dtype::{DType, Scalar, ScalarKind};
pub use error::{ArrayError, BackendError};
pub use host::{HostArray, HostData};
pub use op::BinaryOp;
pub use shape::{GroupShape, Shape};

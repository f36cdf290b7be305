//! In-memory reference backend for Tessera grouped arrays.
//!
//! [`HostBackend`] implements the full [`Backend`](tessera_core::Backend)
//! contract over plain row-major vectors. It is the collaborator used by
//! tests, benchmarks, and anyone who wants grouped arrays without a device.
//!
//! # Storage
//!
//! ```text
//! HostBackend (config + instance id, shared via Arc)
//! └── HostBuffer (shape + dtype + Arc<RwLock<HostData>>)
//!     └── HostData::{F32, F64, I64, C128}(Vec<_>)
//! ```
//!
//! Buffers are handles: cloning one aliases the same storage, so in-place
//! mutation through any clone is visible through all of them.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod buffer;
pub mod config;
pub mod error;
mod kernels;

pub use backend::{BackendInstanceId, HostBackend};
pub use buffer::HostBuffer;
pub use config::HostConfig;
pub use error::ConfigError;

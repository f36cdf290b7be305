//! Persistence of grouped arrays in backend-independent form.
//!
//! # Architecture
//!
//! - [`PersistGuard`] binds a backend to the current thread; at most one
//!   is active per thread, and dropping the guard unbinds it
//! - [`persist`] and [`restore`] marshal a [`GroupedArray`] through the
//!   bound backend into [`PersistedGroups`] and back
//! - [`codec`] writes [`PersistedGroups`] in a compact binary format;
//!   the type also derives serde for use with any serde format
//!
//! # Format
//!
//! ```text
//! [MAGIC "TSRA"] [VERSION u8] [ngroups u32]
//! per group: [dtype u8] [rank u32] [dims u64 × rank] [payload, little-endian]
//! ```
//!
//! [`GroupedArray`]: tessera_array::GroupedArray

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod context;
pub mod error;
pub mod persist;

pub use context::{active_backend_name, with_persist_context, PersistGuard};
pub use error::CodecError;
pub use persist::{persist, restore, PersistedGroups};

/// Magic bytes at the start of every encoded value.
pub const MAGIC: [u8; 4] = *b"TSRA";

/// Current binary format version.
pub const FORMAT_VERSION: u8 = 1;

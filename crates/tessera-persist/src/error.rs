//! Binary codec errors.

use std::io;

use thiserror::Error;

/// Errors from [`codec`](crate::codec) encoding or decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An I/O error occurred during read or write.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The input does not start with the expected `b"TSRA"` magic bytes.
    #[error("invalid magic bytes (expected b\"TSRA\")")]
    InvalidMagic,
    /// The format version is not supported by this build.
    #[error("unsupported format version {found}")]
    UnsupportedVersion {
        /// The version found in the input.
        found: u8,
    },
    /// A dtype tag is not recognized.
    #[error("unknown dtype tag {tag}")]
    UnknownDtype {
        /// The unrecognized tag.
        tag: u8,
    },
    /// A group could not be decoded or does not fit the format's limits.
    #[error("malformed group {group}: {detail}")]
    MalformedGroup {
        /// Index of the offending group.
        group: usize,
        /// Human-readable description of what went wrong.
        detail: String,
    },
}

//! Object error types.

use thiserror::Error;

/// Errors that can occur while decoding or reading git objects.
#[derive(Debug, Error)]
pub enum ObjectError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The object is not present in the local store.
    ///
    /// Absence is a traversal-level condition, reported distinctly from
    /// decode failures on objects that are present.
    #[error("object not found: {0}")]
    NotFound(String),

    /// Zlib inflation failed.
    #[error("decompression failed: {0}")]
    Compression(String),

    /// The object content is malformed.
    #[error("invalid object: {0}")]
    InvalidObject(String),

    /// The object content does not hash to its identifier.
    #[error("corruption detected: {0}")]
    Corruption(String),
}

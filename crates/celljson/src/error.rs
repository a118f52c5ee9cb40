//! Error types for document construction, parsing, and serialization.

use std::fmt;

use thiserror::Error;

use crate::value::Kind;

/// Errors that can occur while building, parsing, or serializing a document.
#[derive(Error, Debug)]
pub enum JsonError {
    /// An allocation failed during construction, insertion, growth, or cloning.
    #[error("out of memory")]
    OutOfMemory,

    /// The input was not a single well-formed JSON value.
    /// `offset` is the byte position where the problem was detected.
    #[error("malformed JSON at byte {offset}: {message}")]
    Malformed { offset: usize, message: String },

    /// Arrays/objects were nested deeper than the parser's depth bound.
    #[error("nesting deeper than {max_depth} levels at byte {offset}")]
    DepthExceeded { offset: usize, max_depth: usize },

    /// The destination handed to `dump` cannot hold the serialized output.
    #[error("output buffer too small: needed at least {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// A typed read or insert found a different variant than it asked for.
    #[error("expected {expected}, found {found}")]
    UnexpectedType { expected: Kind, found: Kind },

    /// A string read as text did not hold valid UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    /// A typed object read asked for a key that is not present.
    #[error("missing field \"{0}\"")]
    MissingField(String),

    /// Reading or writing a document file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<std::collections::TryReserveError> for JsonError {
    fn from(_: std::collections::TryReserveError) -> Self {
        JsonError::OutOfMemory
    }
}

/// Convenience alias used throughout celljson.
pub type Result<T> = std::result::Result<T, JsonError>;

/// A failed insertion. Ownership of the value that could not be stored goes
/// back to the caller through `value`.
pub struct Rejected<T> {
    pub error: JsonError,
    pub value: T,
}

impl<T> Rejected<T> {
    pub(crate) fn new(error: JsonError, value: T) -> Self {
        Self { error, value }
    }

    /// Drop the rejected value and keep only the error.
    pub fn into_error(self) -> JsonError {
        self.error
    }
}

impl<T> fmt::Debug for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "insert rejected: {}", self.error)
    }
}

impl<T> std::error::Error for Rejected<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<T> From<Rejected<T>> for JsonError {
    fn from(rejected: Rejected<T>) -> Self {
        rejected.error
    }
}

//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("invalid header: expected {expected} origins, got {actual}")]
    InvalidHeader { expected: usize, actual: usize },

    #[error("invalid redirect code: {0} (must be 0 or between 300 and 310)")]
    InvalidRedirect(u16),

    #[error("chunk index {index} out of range (resource has {length} chunks)")]
    OutOfRange { index: usize, length: usize },

    #[error("range {start}..={end} not satisfiable for {length} chunks")]
    RangeNotSatisfiable { start: i64, end: i64, length: usize },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Protocol error types.

use wttp_core::{AccountId, Method, MethodSet, Role};

/// Protocol error type.
///
/// Every failure a verb or role-graph operation can produce, carrying the
/// offending values. [`ProtocolError::status`] maps each variant onto the
/// numeric status a transport would send.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("account {account} lacks role {role}")]
    Unauthorized { account: AccountId, role: Role },

    #[error("role {0} cannot be used here")]
    InvalidRole(Role),

    #[error("invalid header: expected {expected} origins, got {actual}")]
    InvalidHeader { expected: usize, actual: usize },

    #[error("invalid redirect code: {0}")]
    InvalidRedirect(u16),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("gone: {0}")]
    Gone(String),

    #[error("method {method} not allowed (allowed: {allowed})")]
    MethodNotAllowed { method: Method, allowed: MethodSet },

    #[error("{method} rejected on immutable resource {path}")]
    Immutable { path: String, method: Method },

    #[error("account {account} lacks role {role} required for {method}")]
    Forbidden {
        account: AccountId,
        role: Role,
        method: Method,
    },

    #[error("chunk index {index} out of range (resource has {length} chunks)")]
    OutOfRange { index: usize, length: usize },

    #[error("range {start}..={end} not satisfiable for {length} chunks")]
    RangeNotSatisfiable { start: i64, end: i64, length: usize },

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] wttp_storage::StorageError),

    #[error("metadata error: {0}")]
    Metadata(#[from] wttp_metadata::MetadataError),

    #[error("core error: {0}")]
    Core(wttp_core::Error),
}

impl From<wttp_core::Error> for ProtocolError {
    fn from(error: wttp_core::Error) -> Self {
        use wttp_core::Error as E;
        match error {
            E::InvalidHeader { expected, actual } => Self::InvalidHeader { expected, actual },
            E::InvalidRedirect(code) => Self::InvalidRedirect(code),
            E::OutOfRange { index, length } => Self::OutOfRange { index, length },
            E::RangeNotSatisfiable { start, end, length } => {
                Self::RangeNotSatisfiable { start, end, length }
            }
            E::Config(message) => Self::Config(message),
            E::InvalidPath(path) => Self::BadRequest(format!("invalid path: {path:?}")),
            other => Self::Core(other),
        }
    }
}

impl ProtocolError {
    /// Stable identifier for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::InvalidRole(_) => "invalid_role",
            Self::InvalidHeader { .. } => "invalid_header",
            Self::InvalidRedirect(_) => "invalid_redirect",
            Self::NotFound(_) => "not_found",
            Self::Gone(_) => "gone",
            Self::MethodNotAllowed { .. } => "method_not_allowed",
            Self::Immutable { .. } => "immutable",
            Self::Forbidden { .. } => "forbidden",
            Self::OutOfRange { .. } => "out_of_range",
            Self::RangeNotSatisfiable { .. } => "range_not_satisfiable",
            Self::BadRequest(_) => "bad_request",
            Self::Config(_) => "config_error",
            Self::Storage(_) => "storage_error",
            Self::Metadata(_) => "metadata_error",
            Self::Core(_) => "core_error",
        }
    }

    /// Numeric status for this error.
    pub fn status(&self) -> u16 {
        match self {
            Self::Unauthorized { .. } => 403,
            Self::InvalidRole(_) => 400,
            Self::InvalidHeader { .. } => 400,
            Self::InvalidRedirect(_) => 400,
            Self::NotFound(_) => 404,
            Self::Gone(_) => 410,
            Self::MethodNotAllowed { .. } => 405,
            Self::Immutable { .. } => 405,
            Self::Forbidden { .. } => 403,
            Self::OutOfRange { .. } => 416,
            Self::RangeNotSatisfiable { .. } => 416,
            Self::BadRequest(_) => 400,
            Self::Config(_) => 500,
            Self::Storage(_) => 500,
            Self::Metadata(_) => 500,
            Self::Core(e) => match e {
                wttp_core::Error::InvalidHash(_) => 400,
                _ => 500,
            },
        }
    }
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;

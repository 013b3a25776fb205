//! CIM object model errors

use thiserror::Error;

use crate::status::StatusCode;

/// Result type for object model operations
pub type Result<T> = std::result::Result<T, CimError>;

/// Object model errors
///
/// Contract violations on handles and containers surface as one of the
/// dedicated variants. Failures reported by a repository or a remote
/// CIM server carry a [`StatusCode`] in [`CimError::Status`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CimError {
    /// Accessor called on a handle that was never attached to a body
    #[error("uninitialized object")]
    UninitializedObject,

    /// Name already present in a container or repository
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Rename refused while a container indexes the member by its name
    #[error("cannot rename {0} while it is held by a container")]
    InContainer(String),

    /// Lookup failed
    #[error("not found: {0}")]
    NotFound(String),

    /// Declared type, array-ness or identity inconsistent with the request
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Not a legal CIM identifier
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    /// Not a legal namespace name
    #[error("invalid namespace name: {0:?}")]
    InvalidNamespaceName(String),

    /// Malformed datetime string
    #[error("invalid datetime: {0:?}")]
    InvalidDateTime(String),

    /// Malformed object path string
    #[error("invalid object path {path:?}: {message}")]
    InvalidObjectPath { path: String, message: String },

    /// Container index out of range
    #[error("index {index} out of bounds (size {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// Failure carrying a standard CIM status code
    #[error("{code}: {message}")]
    Status { code: StatusCode, message: String },
}

impl CimError {
    pub fn already_exists(name: impl Into<String>) -> Self {
        Self::AlreadyExists(name.into())
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch(message.into())
    }

    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidObjectPath {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn out_of_bounds(index: usize, size: usize) -> Self {
        Self::IndexOutOfBounds { index, size }
    }

    pub fn status(code: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            code,
            message: message.into(),
        }
    }

    /// Status code this error maps to at the repository/client boundary
    pub fn code(&self) -> StatusCode {
        match self {
            Self::Status { code, .. } => *code,
            Self::AlreadyExists(_) => StatusCode::AlreadyExists,
            Self::NotFound(_) => StatusCode::NotFound,
            Self::TypeMismatch(_) => StatusCode::TypeMismatch,
            Self::InvalidName(_) | Self::InvalidDateTime(_) | Self::InvalidObjectPath { .. } => {
                StatusCode::InvalidParameter
            }
            Self::InvalidNamespaceName(_) => StatusCode::InvalidNamespace,
            Self::UninitializedObject | Self::InContainer(_) | Self::IndexOutOfBounds { .. } => {
                StatusCode::Failed
            }
        }
    }

    /// Message text without the status prefix
    pub fn message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

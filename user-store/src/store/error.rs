//! Store error types.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No entry exists for the identifier.
    #[error("user with ID '{0}' not found")]
    NotFound(String),

    /// An entry already exists for the identifier.
    #[error("user with ID '{0}' already exists")]
    AlreadyExists(String),

    /// The request itself is malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The store cannot serve requests right now.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Internal error.
    #[error("internal: {0}")]
    Internal(String),
}

impl StoreError {
    /// HTTP-style status code carried by this error on the wire.
    pub fn code(&self) -> u16 {
        match self {
            StoreError::NotFound(_) => 404,
            StoreError::AlreadyExists(_) => 409,
            StoreError::InvalidArgument(_) => 400,
            StoreError::Unavailable(_) => 503,
            StoreError::Internal(_) => 500,
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

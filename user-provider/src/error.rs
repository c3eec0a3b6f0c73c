//! Error taxonomy for connecting and reconciling.
//!
//! Callers branch on [`StatusCode`] and [`ErrorKind`] only, never on
//! message text.

use std::fmt;
use thiserror::Error;

/// Status code carried by every store service error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    NotFound,
    AlreadyExists,
    Unavailable,
    Unknown,
}

/// Error returned by a store service call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code:?}: {message}")]
pub struct ServiceError {
    pub code: StatusCode,
    pub message: String,
}

impl ServiceError {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code == StatusCode::NotFound
    }

    pub fn is_already_exists(&self) -> bool {
        self.code == StatusCode::AlreadyExists
    }
}

/// Errors producing a client for a managed resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// The provider config or its credentials could not be resolved.
    #[error("cannot get credentials: {0}")]
    CredentialResolutionFailed(String),

    /// A client could not be built from the resolved configuration.
    #[error("cannot create new service: {0}")]
    ConnectionFailed(String),
}

/// Step of the reconcile state machine, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Connect,
    Observe,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Connect => "connect",
            Operation::Observe => "observe",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Classification of a failed reconcile pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    CredentialResolutionFailed,
    ConnectionFailed,
    Unavailable,
    Unknown,
    /// Races on the same identifier kept the pass from settling.
    Contention,
    /// The driver cancelled the pass.
    Cancelled,
}

impl From<StatusCode> for ErrorKind {
    fn from(code: StatusCode) -> Self {
        match code {
            StatusCode::NotFound => ErrorKind::NotFound,
            StatusCode::AlreadyExists => ErrorKind::AlreadyExists,
            StatusCode::Unavailable => ErrorKind::Unavailable,
            StatusCode::Unknown => ErrorKind::Unknown,
        }
    }
}

/// Terminal failure of a single reconcile pass.
///
/// Every variant is terminal for the current pass only; the scheduler decides
/// when to drive the resource again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("cannot connect: {0}")]
    Connect(#[source] ConnectError),

    #[error("cannot {op} user: {source}")]
    Service {
        op: Operation,
        #[source]
        source: ServiceError,
    },

    #[error("user {id} did not settle after {attempts} transitions")]
    Contention { id: String, attempts: u32 },

    #[error("reconcile cancelled during {0}")]
    Cancelled(Operation),
}

impl ReconcileError {
    pub fn service(op: Operation, source: ServiceError) -> Self {
        ReconcileError::Service { op, source }
    }

    /// The state machine step that failed.
    pub fn operation(&self) -> Operation {
        match self {
            ReconcileError::Connect(_) => Operation::Connect,
            ReconcileError::Service { op, .. } => *op,
            ReconcileError::Contention { .. } => Operation::Observe,
            ReconcileError::Cancelled(op) => *op,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ReconcileError::Connect(ConnectError::CredentialResolutionFailed(_)) => {
                ErrorKind::CredentialResolutionFailed
            }
            ReconcileError::Connect(ConnectError::ConnectionFailed(_)) => {
                ErrorKind::ConnectionFailed
            }
            ReconcileError::Service { source, .. } => source.code.into(),
            ReconcileError::Contention { .. } => ErrorKind::Contention,
            ReconcileError::Cancelled(_) => ErrorKind::Cancelled,
        }
    }
}

//! Reconcilers for managed resources.
//!
//! A reconciler compares desired state (the managed resource) with actual
//! state (the external store) and takes actions to converge. Each pass is
//! evaluated fresh; no controller state survives between passes.

pub mod user;

use async_trait::async_trait;
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::error::ReconcileError;
use crate::external::ConnectionDetails;

pub use user::{ReconcilerOptions, UserReconciler};

/// Result of observing the external resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    pub exists: bool,
    pub up_to_date: bool,
    pub connection_details: ConnectionDetails,
}

/// Mutation performed by a successful pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Created,
    Updated,
    Deleted,
    Unchanged,
}

/// Successful end of a reconcile pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub action: Action,
    /// When the resource should be evaluated again; `None` once there is
    /// nothing left to converge.
    pub requeue_after: Option<Duration>,
    pub connection_details: ConnectionDetails,
}

/// Trait for resource reconcilers.
#[async_trait]
pub trait Reconciler: Send + Sync {
    /// The managed resource type.
    type Resource: Send + Sync;

    /// Reconcile the resource - compare desired vs actual state and take action.
    async fn reconcile(
        &self,
        resource: &Self::Resource,
        cancel: &CancelToken,
    ) -> Result<ReconcileOutcome, ReconcileError>;

    /// Handle resource deletion (finalization).
    async fn finalize(
        &self,
        resource: &Self::Resource,
        cancel: &CancelToken,
    ) -> Result<ReconcileOutcome, ReconcileError>;
}

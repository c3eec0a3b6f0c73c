//! User reconciler - converges store users with their managed resources.
//!
//! Each pass runs a small state machine:
//!
//! ```text
//! Connect → Observe ─ not found ──→ Create ─ already exists ─→ Observe
//!              │                      └─ ok ─→ Converged
//!              ├─ up to date ─→ Converged
//!              └─ differs ────→ Update ─ not found ─→ Create
//!                                 └─ ok ─→ Converged
//! ```
//!
//! Resources marked for deletion go straight from Connect to Delete, where a
//! missing user counts as success. Races with another reconciler of the same
//! identifier degrade to another transition instead of failing.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{Action, Observation, ReconcileOutcome, Reconciler};
use crate::cancel::CancelToken;
use crate::connector::Connector;
use crate::error::{ConnectError, Operation, ReconcileError, ServiceError, StatusCode};
use crate::external::{ConnectionDetails, ExternalClient, is_up_to_date};
use crate::resource::{UserResource, UserSpec};

/// Tuning for the user reconciler.
#[derive(Debug, Clone)]
pub struct ReconcilerOptions {
    /// Requeue delay after a converged pass.
    pub poll_interval: Duration,
    /// Deadline for producing a client.
    pub connect_timeout: Duration,
    /// Deadline for each store call.
    pub call_timeout: Duration,
    /// Bound on race-driven transitions within one pass.
    pub max_transitions: u32,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            call_timeout: Duration::from_secs(10),
            max_transitions: 8,
        }
    }
}

enum Step {
    Observe,
    Create,
    Update,
}

/// User reconciler that creates/updates/deletes users in the store.
pub struct UserReconciler {
    connector: Arc<dyn Connector>,
    options: ReconcilerOptions,
}

impl UserReconciler {
    pub fn new(connector: Arc<dyn Connector>, options: ReconcilerOptions) -> Self {
        Self { connector, options }
    }

    async fn connect(
        &self,
        resource: &UserResource,
        cancel: &CancelToken,
    ) -> Result<ExternalClient, ReconcileError> {
        let connecting = tokio::time::timeout(
            self.options.connect_timeout,
            self.connector.connect(resource),
        );
        match cancel.run(connecting).await {
            None => Err(ReconcileError::Cancelled(Operation::Connect)),
            Some(Err(_)) => Err(ReconcileError::Connect(ConnectError::ConnectionFailed(
                format!("timed out after {:?}", self.options.connect_timeout),
            ))),
            Some(Ok(result)) => result.map_err(ReconcileError::Connect),
        }
    }

    /// Run one store call under the pass's cancellation and the call deadline.
    ///
    /// The outer error is cancellation; the inner result is the store's answer.
    async fn call<T, F>(
        &self,
        op: Operation,
        cancel: &CancelToken,
        fut: F,
    ) -> Result<Result<T, ServiceError>, ReconcileError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        match cancel
            .run(tokio::time::timeout(self.options.call_timeout, fut))
            .await
        {
            None => Err(ReconcileError::Cancelled(op)),
            Some(Err(_)) => Ok(Err(ServiceError::new(
                StatusCode::Unavailable,
                format!("{} timed out after {:?}", op, self.options.call_timeout),
            ))),
            Some(Ok(result)) => Ok(result),
        }
    }

    async fn observe(
        &self,
        client: &ExternalClient,
        spec: &UserSpec,
        cancel: &CancelToken,
    ) -> Result<Observation, ReconcileError> {
        match self
            .call(Operation::Observe, cancel, client.get_external(&spec.id))
            .await?
        {
            Ok(user) => Ok(Observation {
                exists: true,
                up_to_date: is_up_to_date(spec, &user),
                connection_details: client.connection_details(&user),
            }),
            Err(e) if e.is_not_found() => Ok(Observation::default()),
            Err(e) => Err(ReconcileError::service(Operation::Observe, e)),
        }
    }

    fn converged(&self, action: Action, details: ConnectionDetails) -> ReconcileOutcome {
        ReconcileOutcome {
            action,
            requeue_after: Some(self.options.poll_interval),
            connection_details: details,
        }
    }
}

#[async_trait]
impl Reconciler for UserReconciler {
    type Resource = UserResource;

    async fn reconcile(
        &self,
        resource: &UserResource,
        cancel: &CancelToken,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        if resource.deletion_requested {
            return self.finalize(resource, cancel).await;
        }

        let spec = &resource.spec;
        debug!("Reconciling user {} ({})", resource.name, spec.id);
        let client = self.connect(resource, cancel).await?;

        // At least one observation per pass
        let max_transitions = self.options.max_transitions.max(1);
        let mut step = Step::Observe;
        for _ in 0..max_transitions {
            step = match step {
                Step::Observe => {
                    let observation = self.observe(&client, spec, cancel).await?;
                    if !observation.exists {
                        Step::Create
                    } else if observation.up_to_date {
                        debug!("User {} ({}) is up to date", resource.name, spec.id);
                        return Ok(self.converged(Action::Unchanged, observation.connection_details));
                    } else {
                        Step::Update
                    }
                }
                Step::Create => {
                    match self
                        .call(Operation::Create, cancel, client.create_external(spec))
                        .await?
                    {
                        Ok(user) => {
                            info!("User {} ({}) created", resource.name, spec.id);
                            return Ok(self.converged(Action::Created, client.connection_details(&user)));
                        }
                        Err(e) if e.is_already_exists() => {
                            // Another reconciler created it first
                            debug!("User {} appeared concurrently, re-observing", spec.id);
                            Step::Observe
                        }
                        Err(e) => return Err(ReconcileError::service(Operation::Create, e)),
                    }
                }
                Step::Update => {
                    match self
                        .call(Operation::Update, cancel, client.update_external(spec))
                        .await?
                    {
                        Ok(user) => {
                            info!("User {} ({}) updated", resource.name, spec.id);
                            return Ok(self.converged(Action::Updated, client.connection_details(&user)));
                        }
                        Err(e) if e.is_not_found() => {
                            // Deleted between observe and update
                            debug!("User {} vanished before update, creating", spec.id);
                            Step::Create
                        }
                        Err(e) => return Err(ReconcileError::service(Operation::Update, e)),
                    }
                }
            };
        }

        warn!(
            "User {} ({}) did not settle after {} transitions",
            resource.name, spec.id, max_transitions
        );
        Err(ReconcileError::Contention {
            id: spec.id.clone(),
            attempts: max_transitions,
        })
    }

    async fn finalize(
        &self,
        resource: &UserResource,
        cancel: &CancelToken,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let id = &resource.spec.id;
        info!("Finalizing (deleting) user {} ({})", resource.name, id);
        let client = self.connect(resource, cancel).await?;

        match self
            .call(Operation::Delete, cancel, client.delete_external(id))
            .await?
        {
            Ok(()) => info!("User {} ({}) deleted", resource.name, id),
            Err(e) if e.is_not_found() => debug!("User {} already absent", id),
            Err(e) => return Err(ReconcileError::service(Operation::Delete, e)),
        }

        Ok(ReconcileOutcome {
            action: Action::Deleted,
            requeue_after: None,
            connection_details: ConnectionDetails::new(),
        })
    }
}

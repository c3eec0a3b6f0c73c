//! Controller: drives reconciles for the declared resources.
//!
//! The controller owns the desired state and decides when each resource is
//! reconciled. Keys arrive from the work queue; at most one reconcile runs per
//! key, and at most `max_concurrent` run in total. A key that arrives while
//! its reconcile is in flight is marked dirty and processed again right after.

use dashmap::{DashMap, DashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::error::ReconcileError;
use crate::reconciler::{ReconcileOutcome, Reconciler};
use crate::resource::ManagedResource;
use crate::scheduler::{Backoff, Requeue};

/// Result of processing one key.
pub type ProcessResult = Result<ReconcileOutcome, ReconcileError>;

pub struct Controller<R: Reconciler> {
    reconciler: R,
    desired: DashMap<String, R::Resource>,
    requeue: Arc<dyn Requeue>,
    backoff: Backoff,
    in_flight: DashSet<String>,
    dirty: DashSet<String>,
    permits: Semaphore,
}

impl<R> Controller<R>
where
    R: Reconciler + 'static,
    R::Resource: ManagedResource + Clone + PartialEq + 'static,
{
    pub fn new(reconciler: R, requeue: Arc<dyn Requeue>, max_concurrent: usize) -> Self {
        Self {
            reconciler,
            desired: DashMap::new(),
            requeue,
            backoff: Backoff::default(),
            in_flight: DashSet::new(),
            dirty: DashSet::new(),
            permits: Semaphore::new(max_concurrent.max(1)),
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Declare (or replace) the desired state of a resource and schedule it.
    pub fn apply(&self, resource: R::Resource) {
        let key = resource.key().to_string();
        self.desired.insert(key.clone(), resource);
        self.requeue.requeue_after(&key, Duration::ZERO);
    }

    /// Stop managing a resource without touching the external user.
    pub fn remove(&self, key: &str) -> Option<R::Resource> {
        self.backoff.reset(key);
        self.desired.remove(key).map(|(_, resource)| resource)
    }

    pub fn is_managed(&self, key: &str) -> bool {
        self.desired.contains_key(key)
    }

    /// Reconcile the resource behind `key` once and schedule what comes next.
    ///
    /// Returns `None` when nothing ran: the key is unknown or its reconcile
    /// is already in flight.
    pub async fn process(&self, key: &str, cancel: &CancelToken) -> Option<ProcessResult> {
        let resource = self.desired.get(key).map(|r| r.value().clone())?;

        if !self.in_flight.insert(key.to_string()) {
            debug!("{} is being reconciled, marking dirty", key);
            self.dirty.insert(key.to_string());
            return None;
        }

        let result = match self.permits.acquire().await {
            Ok(_permit) => self.reconciler.reconcile(&resource, cancel).await,
            Err(_) => {
                self.in_flight.remove(key);
                return None;
            }
        };

        match &result {
            Ok(outcome) => {
                self.backoff.reset(key);
                match outcome.requeue_after {
                    Some(after) => {
                        debug!("{} converged ({:?}), next pass in {:?}", key, outcome.action, after);
                        self.requeue.requeue_after(key, after);
                    }
                    None => {
                        // Nothing left to converge; forget it unless it changed meanwhile
                        if self.desired.remove_if(key, |_, r| *r == resource).is_some() {
                            info!("{} finalized, no longer managed", key);
                        }
                    }
                }
            }
            Err(ReconcileError::Cancelled(op)) => {
                debug!("{} cancelled during {}", key, op);
            }
            Err(e) => {
                let delay = self.backoff.next_delay(key);
                warn!("Failed to reconcile {}: {} (retry in {:?})", key, e, delay);
                self.requeue.requeue_after(key, delay);
            }
        }

        self.in_flight.remove(key);
        if self.dirty.remove(key).is_some() && !cancel.is_cancelled() {
            self.requeue.requeue_after(key, Duration::ZERO);
        }

        Some(result)
    }

    /// Process keys from `rx` until cancelled or the queue closes.
    ///
    /// In-flight reconciles observe `cancel` and are drained before returning.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<String>, cancel: CancelToken) {
        info!("Controller started ({} resources)", self.desired.len());
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        warn!("Reconcile task failed: {}", e);
                    }
                }
                key = rx.recv() => {
                    let Some(key) = key else { break };
                    let this = Arc::clone(&self);
                    let token = cancel.clone();
                    tasks.spawn(async move {
                        this.process(&key, &token).await;
                    });
                }
            }
        }

        info!("Controller stopping, draining {} reconciles", tasks.len());
        while tasks.join_next().await.is_some() {}
    }
}

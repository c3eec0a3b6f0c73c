//! Requeue scheduling for managed resources.
//!
//! The reconciler decides *when* a resource should be looked at again; the
//! scheduler owns the timers. Keys are deduplicated: a key waiting in the
//! queue fires once, at the earliest deadline requested for it.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::trace;

/// Schedules a key to be processed again after a delay.
pub trait Requeue: Send + Sync {
    fn requeue_after(&self, key: &str, after: Duration);
}

/// Timer-backed work queue delivering keys over a channel.
#[derive(Clone)]
pub struct WorkQueue {
    pending: Arc<DashMap<String, Instant>>,
    tx: mpsc::UnboundedSender<String>,
}

impl WorkQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                pending: Arc::new(DashMap::new()),
                tx,
            },
            rx,
        )
    }

    /// Deliver `key` right away.
    pub fn enqueue(&self, key: &str) {
        self.requeue_after(key, Duration::ZERO);
    }

    /// Number of keys waiting on a timer.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl Requeue for WorkQueue {
    fn requeue_after(&self, key: &str, after: Duration) {
        let deadline = Instant::now() + after;

        // Keep only the earliest deadline per key
        match self.pending.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                if *entry.get() <= deadline {
                    trace!("{} already due earlier", key);
                    return;
                }
                entry.insert(deadline);
            }
            Entry::Vacant(entry) => {
                entry.insert(deadline);
            }
        }

        let pending = Arc::clone(&self.pending);
        let tx = self.tx.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            // A later, earlier-deadline request owns the key now if this misses
            if pending.remove_if(&key, |_, due| *due == deadline).is_some() {
                let _ = tx.send(key);
            }
        });
    }
}

/// Exponential per-key backoff for failed passes.
pub struct Backoff {
    failures: DashMap<String, u32>,
    base: Duration,
    cap: Duration,
}

impl Backoff {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self {
            failures: DashMap::new(),
            base,
            cap,
        }
    }

    /// Record a failure for `key` and return the delay before its next attempt.
    pub fn next_delay(&self, key: &str) -> Duration {
        let mut failures = self.failures.entry(key.to_string()).or_insert(0);
        let exponent = (*failures).min(16);
        *failures = failures.saturating_add(1);
        self.base.saturating_mul(1 << exponent).min(self.cap)
    }

    pub fn reset(&self, key: &str) {
        self.failures.remove(key);
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(300))
    }
}

//! Cancellation signal shared between the driver and in-flight reconciles.

use std::future::Future;
use tokio::sync::watch;

/// Owning side of a cancellation signal.
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// A token observing this handle.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Observing side of a cancellation signal. Cheap to clone.
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. A dropped handle never cancels.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Run `fut` unless cancellation wins first.
    ///
    /// Returns `None` if cancelled. An already-cancelled token never polls
    /// `fut`, so no request is started after shutdown began.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            out = fut => Some(out),
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::never()
    }
}

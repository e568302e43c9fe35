//! Bounded fan-out with cooperative cancellation.
//!
//! Work items run concurrently inside the calling task (no spawning), at most
//! `limit` at a time. The call returns only after every item has settled, and
//! results come back in input order so callers can rank deterministically.

use futures_util::future::join_all;
use std::future::Future;
use tokio::sync::{watch, Semaphore};

/// Caller-side trigger for cancelling a run.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

impl CancelToken {
    /// A token that never fires.
    pub fn never() -> Self {
        let (_handle, token) = cancel_pair();
        token
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. Pends forever if the handle is
    /// dropped without cancelling.
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

    /// Runs `work` unless cancellation fires first, in which case `None`.
    pub async fn run_until_cancelled<F: Future>(&self, work: F) -> Option<F::Output> {
        if self.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            out = work => Some(out),
        }
    }
}

/// Maps every item through `f` with at most `limit` items in flight. A
/// cancelled item yields `None`, the same as an item whose work returned
/// `None`.
pub async fn bounded_fan_out<T, R, F, Fut>(
    items: Vec<T>,
    limit: usize,
    cancel: &CancelToken,
    f: F,
) -> Vec<Option<R>>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Option<R>>,
{
    let semaphore = Semaphore::new(limit.max(1));
    let semaphore = &semaphore;
    let tasks = items.into_iter().map(|item| {
        let work = f(item);
        async move {
            let _permit = cancel.run_until_cancelled(semaphore.acquire()).await?.ok()?;
            cancel.run_until_cancelled(work).await.flatten()
        }
    });
    join_all(tasks).await
}

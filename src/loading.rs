//! Count of requests in flight, shared between the fetch tasks and the UI.

use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct LoadingCounter {
    count: Arc<watch::Sender<usize>>,
}

impl Default for LoadingCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadingCounter {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { count: Arc::new(tx) }
    }

    pub fn increment(&self) {
        self.count.send_modify(|n| *n += 1);
    }

    /// Never goes below zero.
    pub fn decrement(&self) {
        self.count.send_modify(|n| *n = n.saturating_sub(1));
    }

    pub fn count(&self) -> usize {
        *self.count.borrow()
    }

    pub fn is_loading(&self) -> bool {
        self.count() > 0
    }

    /// Resolves once no request is in flight.
    pub async fn on_idle(&self) {
        let mut rx = self.count.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    /// Increments now and decrements when the guard drops.
    pub fn guard(&self) -> LoadingGuard {
        self.increment();
        LoadingGuard {
            counter: self.clone(),
        }
    }
}

pub struct LoadingGuard {
    counter: LoadingCounter,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.counter.decrement();
    }
}

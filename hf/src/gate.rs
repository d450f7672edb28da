//! ReadinessGate - write-once NotReady -> Ready latch

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::debug;

/// Latch recording whether the worker can accept dispatches
///
/// Flips from not-ready to ready exactly once and never back. Every thread
/// that calls [`is_ready`](Self::is_ready) after [`mark_ready`](Self::mark_ready)
/// returns observes `true`.
#[derive(Debug, Default)]
pub struct ReadinessGate {
    ready: AtomicBool,
    notify: Notify,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Open the gate
    ///
    /// Returns `true` only for the call that performed the flip; every later
    /// call is ignored and returns `false`.
    pub fn mark_ready(&self) -> bool {
        let flipped = self
            .ready
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if flipped {
            debug!("ReadinessGate::mark_ready: gate opened");
            self.notify.notify_waiters();
        } else {
            debug!("ReadinessGate::mark_ready: already open, ignoring");
        }
        flipped
    }

    /// Wait until the gate opens
    pub async fn wait_ready(&self) {
        loop {
            // Register before checking so a concurrent flip cannot be missed
            let notified = self.notify.notified();
            if self.is_ready() {
                return;
            }
            notified.await;
        }
    }

    /// Wait until the gate opens or `timeout` elapses; returns whether it opened
    pub async fn wait_ready_timeout(&self, timeout: Duration) -> bool {
        debug!(?timeout, "ReadinessGate::wait_ready_timeout: called");
        tokio::time::timeout(timeout, self.wait_ready()).await.is_ok()
    }
}

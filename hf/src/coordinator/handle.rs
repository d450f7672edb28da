//! WorkerInbox - the worker's way back into the Coordinator

use std::sync::Weak;

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::ack::Acknowledgment;

use super::core::{Coordinator, Shared};
use super::messages::ReadyOutcome;

/// Handle a launched worker uses to call the host
///
/// Holds the coordinator weakly so a worker never keeps it alive. Cloneable.
#[derive(Clone)]
pub struct WorkerInbox {
    shared: Weak<Shared>,
    initialized_method: String,
}

impl std::fmt::Debug for WorkerInbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerInbox")
            .field("initialized_method", &self.initialized_method)
            .field("attached", &(self.shared.strong_count() > 0))
            .finish()
    }
}

impl WorkerInbox {
    pub(super) fn new(shared: Weak<Shared>, initialized_method: String) -> Self {
        debug!(%initialized_method, "WorkerInbox::new: called");
        Self {
            shared,
            initialized_method,
        }
    }

    fn coordinator(&self) -> Option<Coordinator> {
        self.shared.upgrade().map(Coordinator::from_shared)
    }

    /// Handle a method call from the worker
    ///
    /// The initialized method marks the worker ready and acknowledges with
    /// `true`; anything else is acknowledged as not implemented.
    pub fn call(&self, method: &str, _args: Vec<Value>, ack: Acknowledgment) {
        debug!(%method, "WorkerInbox::call: called");
        if method != self.initialized_method {
            ack.not_implemented();
            return;
        }

        match self.coordinator() {
            Some(coordinator) => {
                coordinator.on_ready();
                ack.success(json!(true));
            }
            None => {
                warn!("Worker initialized after its coordinator was dropped");
                ack.error("coordinator-gone", None, Value::Null);
            }
        }
    }

    /// Report that the worker can accept dispatches
    pub fn initialized(&self) -> ReadyOutcome {
        debug!("WorkerInbox::initialized: called");
        match self.coordinator() {
            Some(coordinator) => coordinator.on_ready(),
            None => {
                warn!("Worker initialized after its coordinator was dropped");
                ReadyOutcome::NotStarted
            }
        }
    }
}

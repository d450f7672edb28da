//! Acknowledgment - single-fire completion signal for one dispatch

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::metrics::DispatchCounters;

/// How the worker finished handling a dispatched event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AckOutcome {
    Success(Value),
    Error {
        code: String,
        message: Option<String>,
        details: Value,
    },
    NotImplemented,
}

impl AckOutcome {
    /// Every outcome means the worker is done with the event
    pub fn is_done(&self) -> bool {
        true
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AckOutcome::Success(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AckOutcome::Success(_) => "success",
            AckOutcome::Error { .. } => "error",
            AckOutcome::NotImplemented => "not-implemented",
        }
    }
}

enum AckState {
    Pending(Option<oneshot::Sender<AckOutcome>>),
    Fired,
}

struct AckInner {
    seq: u64,
    state: Mutex<AckState>,
    counters: Option<Arc<DispatchCounters>>,
}

/// Completion sink handed to the worker with each invocation
///
/// Clones share one signal. The first `success`, `error` or `not_implemented`
/// call fires it; later calls are no-ops. A detached acknowledgment has no
/// waiter and only records the outcome.
#[derive(Clone)]
pub struct Acknowledgment {
    inner: Arc<AckInner>,
}

impl std::fmt::Debug for Acknowledgment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Acknowledgment")
            .field("seq", &self.inner.seq)
            .field("fired", &self.is_fired())
            .finish()
    }
}

impl Acknowledgment {
    /// Create an acknowledgment and the receiver a blocking caller waits on
    pub fn pair(seq: u64, counters: Option<Arc<DispatchCounters>>) -> (Self, oneshot::Receiver<AckOutcome>) {
        let (tx, rx) = oneshot::channel();
        let ack = Self {
            inner: Arc::new(AckInner {
                seq,
                state: Mutex::new(AckState::Pending(Some(tx))),
                counters,
            }),
        };
        (ack, rx)
    }

    /// Create a fire-and-forget acknowledgment
    pub fn detached(seq: u64, counters: Option<Arc<DispatchCounters>>) -> Self {
        Self {
            inner: Arc::new(AckInner {
                seq,
                state: Mutex::new(AckState::Pending(None)),
                counters,
            }),
        }
    }

    /// Sequence number of the dispatch this acknowledges
    pub fn seq(&self) -> u64 {
        self.inner.seq
    }

    pub fn is_fired(&self) -> bool {
        let state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(*state, AckState::Fired)
    }

    pub fn success(&self, value: Value) -> bool {
        self.fire(AckOutcome::Success(value))
    }

    pub fn error(&self, code: impl Into<String>, message: Option<String>, details: Value) -> bool {
        self.fire(AckOutcome::Error {
            code: code.into(),
            message,
            details,
        })
    }

    pub fn not_implemented(&self) -> bool {
        self.fire(AckOutcome::NotImplemented)
    }

    /// Fire with `outcome`; returns `false` if already fired
    pub fn fire(&self, outcome: AckOutcome) -> bool {
        let sender = {
            let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
            match std::mem::replace(&mut *state, AckState::Fired) {
                AckState::Fired => {
                    debug!(seq = self.inner.seq, "Acknowledgment::fire: already fired, ignoring");
                    return false;
                }
                AckState::Pending(sender) => sender,
            }
        };

        match &outcome {
            AckOutcome::Success(_) => debug!(seq = self.inner.seq, "Worker acknowledged event"),
            AckOutcome::Error { code, message, .. } => {
                warn!(seq = self.inner.seq, %code, ?message, "Worker reported error for event")
            }
            AckOutcome::NotImplemented => {
                warn!(seq = self.inner.seq, "Worker does not implement the dispatched method")
            }
        }

        if let Some(counters) = &self.inner.counters {
            counters.record_ack(&outcome);
        }

        if let Some(tx) = sender
            && tx.send(outcome).is_err()
        {
            // Waiter gave up (timeout or cancel); the late result is dropped
            debug!(seq = self.inner.seq, "Acknowledgment::fire: waiter gone, discarding");
        }
        true
    }
}

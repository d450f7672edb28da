//! Outcome and status types for the Coordinator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dispatcher::DispatchOutcome;
use crate::metrics::DispatchMetrics;

/// Where the coordinator is in its one-way lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleState {
    /// No worker requested yet
    Uninitialized,
    /// Worker requested, not ready; events are queued
    Starting,
    /// Worker ready; events go straight to it
    Ready,
}

/// Result of a worker start request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StartOutcome {
    /// Worker launched; readiness will follow
    Started,
    /// A worker was already requested; nothing was done
    Duplicate,
    /// The launcher failed; the coordinator stays starting and keeps queuing
    LaunchFailed { reason: String },
}

/// Result of submitting an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmitOutcome {
    /// Held until the worker becomes ready
    Queued { seq: u64, depth: usize },
    /// Handed to the worker without waiting
    Dispatched { seq: u64 },
    /// Handed to the worker and waited on
    Completed { seq: u64, outcome: DispatchOutcome },
}

impl SubmitOutcome {
    pub fn seq(&self) -> u64 {
        match self {
            SubmitOutcome::Queued { seq, .. } => *seq,
            SubmitOutcome::Dispatched { seq } => *seq,
            SubmitOutcome::Completed { seq, .. } => *seq,
        }
    }

    pub fn is_queued(&self) -> bool {
        matches!(self, SubmitOutcome::Queued { .. })
    }
}

/// Result of a readiness signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadyOutcome {
    /// Gate opened after dispatching `count` queued events
    Drained { count: usize },
    /// Readiness was already signalled; ignored
    AlreadyReady,
    /// No worker was requested; ignored
    NotStarted,
    /// Signalled before the channel was attached; completes on attach
    Deferred,
}

/// Observable coordinator state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CoordinatorStatus {
    pub state: LifecycleState,
    pub running: bool,
    pub pending: usize,
    pub peak_pending: usize,
    pub next_seq: u64,
    pub callback_selector: Option<i64>,
    pub starting_since: Option<DateTime<Utc>>,
    pub ready_since: Option<DateTime<Utc>>,
    /// How long the worker has been starting, while not yet ready
    pub starting_for_ms: Option<u64>,
    /// Starting for longer than the configured threshold
    pub stalled: bool,
    pub last_error: Option<String>,
    /// Explicit start requests ignored because a worker was already requested
    pub duplicate_starts: u64,
    pub dispatch: DispatchMetrics,
}

//! Handoff - readiness-gated event delivery to a background worker
//!
//! Handoff sits between a stream of incoming events and a worker that takes a
//! while to start. Every event reaches the worker exactly once and in arrival
//! order, including events that arrive before the worker is ready.
//!
//! # Core Concepts
//!
//! - **Gate**: a write-once latch that opens when the worker reports ready
//! - **Queue**: events accepted while the gate is closed, kept in FIFO order
//! - **Drain**: on readiness, queued events are dispatched oldest first before
//!   the gate opens to direct traffic
//! - **Blocking dispatch**: callers that must not return before the worker
//!   finishes wait on a single-fire acknowledgment, with optional timeout and
//!   cancellation
//!
//! # Modules
//!
//! - [`coordinator`] - lifecycle, routing and the worker inbox
//! - [`dispatcher`] - hands one event to the worker
//! - [`gate`] / [`queue`] - the readiness latch and pending FIFO
//! - [`ack`] - single-fire acknowledgment
//! - [`worker`] - launcher and channel traits the host implements
//! - [`config`] / [`logging`] - configuration loading and log setup

pub mod ack;
pub mod config;
pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod gate;
pub mod logging;
pub mod metrics;
pub mod queue;
pub mod worker;

// Re-export commonly used types
pub use ack::{AckOutcome, Acknowledgment};
pub use config::{Config, LoggingConfig, SettingsConfig};
pub use coordinator::{
    Coordinator, CoordinatorConfig, CoordinatorSlot, CoordinatorStatus, LifecycleState, ReadyOutcome, StartOutcome,
    SubmitOutcome, WorkerInbox,
};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::Error;
pub use event::{Envelope, Event, RegionTransition, TransitionKind};
pub use gate::ReadinessGate;
pub use logging::setup_logging;
pub use metrics::{DispatchCounters, DispatchMetrics};
pub use queue::PendingQueue;
pub use worker::{LaunchRequest, WorkerChannel, WorkerLauncher};

pub use settingsstore::{FileSettings, MemorySettings, SettingsError, SettingsStore};

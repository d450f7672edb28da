//! Coordinator for handing events to a slow-starting worker
//!
//! The Coordinator owns three pieces and routes between them:
//! - **Gate:** whether the worker can accept dispatches yet
//! - **Queue:** events that arrived while the gate was closed
//! - **Dispatcher:** the worker's invocation channel
//!
//! Lifecycle is one-way: `Uninitialized -> Starting -> Ready`.

mod config;
mod core;
mod handle;
mod messages;
mod slot;

pub use config::CoordinatorConfig;
pub use self::core::Coordinator;
pub use handle::WorkerInbox;
pub use messages::{CoordinatorStatus, LifecycleState, ReadyOutcome, StartOutcome, SubmitOutcome};
pub use slot::CoordinatorSlot;

//! Worker boundary traits
//!
//! The worker is an external execution environment. The coordinator only
//! needs two things from it: a way to launch it and a channel to invoke
//! methods on once launched.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ack::Acknowledgment;
use crate::coordinator::WorkerInbox;
use crate::error::Error;

/// Invocation channel into a running worker
pub trait WorkerChannel: Send + Sync {
    /// Send `method` with positional `args`
    ///
    /// Must return without waiting for the worker. The worker fires `ack`
    /// when it has finished with the call.
    fn invoke_method(&self, method: &str, args: Vec<Value>, ack: Acknowledgment);
}

/// What the launcher needs to construct a worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchRequest {
    /// Entry point the worker runs on startup
    #[serde(rename = "callback-selector")]
    pub callback_selector: i64,

    /// Name of the invocation channel to open
    #[serde(rename = "channel-name")]
    pub channel_name: String,
}

/// Constructs the worker and its invocation channel
pub trait WorkerLauncher: Send + Sync {
    /// Launch a worker for `request`
    ///
    /// Returns the invocation channel once the environment exists. The worker
    /// reports readiness later through `inbox`. Implementations return
    /// [`Error::UnresolvedCallback`] when the selector names no entry point.
    fn launch(&self, request: LaunchRequest, inbox: WorkerInbox) -> Result<Arc<dyn WorkerChannel>, Error>;
}

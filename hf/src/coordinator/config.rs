//! Coordinator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Coordinator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Worker method invoked for every dispatched event
    #[serde(rename = "dispatch-method", default = "default_dispatch_method")]
    pub dispatch_method: String,

    /// Default wait limit for blocking dispatch, none means wait forever
    #[serde(rename = "blocking-timeout-ms", default)]
    pub blocking_timeout_ms: Option<u64>,

    /// Name of the invocation channel the launcher opens
    #[serde(rename = "channel-name", default = "default_channel_name")]
    pub channel_name: String,

    /// Method the worker calls once it can accept dispatches
    #[serde(rename = "initialized-method", default = "default_initialized_method")]
    pub initialized_method: String,

    /// Starting for longer than this is reported as stalled
    #[serde(rename = "stall-threshold-secs", default = "default_stall_threshold_secs")]
    pub stall_threshold_secs: u64,

    /// Settings key holding the persisted callback selector
    #[serde(rename = "callback-key", default = "default_callback_key")]
    pub callback_key: String,
}

fn default_dispatch_method() -> String {
    debug!("default_dispatch_method: called");
    "invokeCallback".to_string()
}

fn default_channel_name() -> String {
    debug!("default_channel_name: called");
    "handoff/background".to_string()
}

fn default_initialized_method() -> String {
    debug!("default_initialized_method: called");
    "Dispatcher.initialized".to_string()
}

fn default_stall_threshold_secs() -> u64 {
    debug!("default_stall_threshold_secs: called");
    30
}

fn default_callback_key() -> String {
    debug!("default_callback_key: called");
    "callback_handle".to_string()
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        debug!("CoordinatorConfig::default: called");
        Self {
            dispatch_method: default_dispatch_method(),
            blocking_timeout_ms: None,
            channel_name: default_channel_name(),
            initialized_method: default_initialized_method(),
            stall_threshold_secs: default_stall_threshold_secs(),
            callback_key: default_callback_key(),
        }
    }
}

impl CoordinatorConfig {
    /// Default blocking-dispatch timeout as a Duration
    pub fn blocking_timeout(&self) -> Option<Duration> {
        self.blocking_timeout_ms.map(Duration::from_millis)
    }

    pub fn stall_threshold(&self) -> Duration {
        Duration::from_secs(self.stall_threshold_secs)
    }
}

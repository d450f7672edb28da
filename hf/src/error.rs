//! Handoff error types

use thiserror::Error;

use settingsstore::SettingsError;

/// Errors reported by the coordinator and its collaborators
///
/// None of these are fatal to the coordinator. Dispatching before a worker
/// channel exists is not represented here: it is a broken invariant and
/// panics instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Worker already started; duplicate start request ignored")]
    DuplicateStart,

    #[error("Callback selector {selector} does not resolve to a worker entry point")]
    UnresolvedCallback { selector: i64 },

    #[error("Worker launch failed: {0}")]
    Launch(String),

    #[error("A worker channel is already attached")]
    ChannelAlreadyAttached,

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

impl Error {
    /// Check if this error leaves the worker unable to ever become ready
    pub fn stalls_worker(&self) -> bool {
        matches!(self, Error::UnresolvedCallback { .. } | Error::Launch(_))
    }
}

//! Settings error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

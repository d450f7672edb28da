//! SettingsStore - persisted host-side settings
//!
//! A tiny key/value store for values the host must remember across process
//! restarts, such as the callback selector a background worker is started
//! with. Values are 64-bit integers keyed by string.
//!
//! # Layout
//!
//! ```text
//! settings.json       # {"callback_handle": 1234, ...}
//! settings.json.lock  # advisory lock taken while writing
//! ```
//!
//! # Example
//!
//! ```ignore
//! use settingsstore::{FileSettings, SettingsStore};
//!
//! let settings = FileSettings::open("/tmp/handoff/settings.json")?;
//! settings.set_i64("callback_handle", 42)?;
//! assert_eq!(settings.get_i64("callback_handle")?, Some(42));
//! ```

mod error;
mod store;

pub use error::SettingsError;
pub use store::{FileSettings, MemorySettings, SettingsStore};

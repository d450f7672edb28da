//! Settings store implementations

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use fs2::FileExt;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::SettingsError;

/// Read/write access to persisted integer settings
pub trait SettingsStore: Send + Sync {
    /// Read the value stored under `key`, if any
    fn get_i64(&self, key: &str) -> Result<Option<i64>, SettingsError>;

    /// Store `value` under `key`, replacing any previous value
    fn set_i64(&self, key: &str, value: i64) -> Result<(), SettingsError>;
}

/// Settings persisted as a single JSON object on disk
///
/// Writes replace the whole file through a temp file and rename, and are
/// serialized across processes with an advisory lock on a sidecar file.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileSettings {
    /// Open (or prepare to create) the settings file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let lock_path = sidecar(&path, "lock");
        debug!(?path, "FileSettings::open: called");
        Ok(Self { path, lock_path })
    }

    /// Path of the backing JSON file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, SettingsError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "FileSettings::read_map: no file yet");
                return Ok(Map::new());
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            other => Err(SettingsError::Corrupt {
                path: self.path.clone(),
                reason: format!("expected a JSON object, found {}", kind_name(&other)),
            }),
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<(), SettingsError> {
        let tmp_path = sidecar(&self.path, "tmp");
        let content = serde_json::to_string_pretty(map)?;
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn lock(&self) -> Result<File, SettingsError> {
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        lock_file.lock_exclusive()?;
        Ok(lock_file)
    }
}

impl SettingsStore for FileSettings {
    fn get_i64(&self, key: &str) -> Result<Option<i64>, SettingsError> {
        debug!(%key, "FileSettings::get_i64: called");
        let map = self.read_map()?;
        match map.get(key) {
            None => Ok(None),
            Some(value) => value.as_i64().map(Some).ok_or_else(|| SettingsError::Corrupt {
                path: self.path.clone(),
                reason: format!("value for '{}' is not a 64-bit integer", key),
            }),
        }
    }

    fn set_i64(&self, key: &str, value: i64) -> Result<(), SettingsError> {
        debug!(%key, value, "FileSettings::set_i64: called");
        let lock_file = self.lock()?;

        let mut map = self.read_map()?;
        map.insert(key.to_string(), Value::from(value));
        let result = self.write_map(&map);

        FileExt::unlock(&lock_file)?;
        result?;

        info!(path = ?self.path, %key, "Persisted setting");
        Ok(())
    }
}

/// In-process settings, lost when the process exits
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, i64>>,
}

impl MemorySettings {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one value
    pub fn with_value(key: impl Into<String>, value: i64) -> Self {
        let store = Self::default();
        store
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value);
        store
    }
}

impl SettingsStore for MemorySettings {
    fn get_i64(&self, key: &str) -> Result<Option<i64>, SettingsError> {
        debug!(%key, "MemorySettings::get_i64: called");
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).copied())
    }

    fn set_i64(&self, key: &str, value: i64) -> Result<(), SettingsError> {
        debug!(%key, value, "MemorySettings::set_i64: called");
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value);
        Ok(())
    }
}

fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

//! Handoff configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::coordinator::CoordinatorConfig;

/// Main handoff configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dispatch and worker lifecycle settings
    pub coordinator: CoordinatorConfig,

    /// Persisted settings location
    pub settings: SettingsConfig,

    /// Log output
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .handoff.yml
        let local_config = PathBuf::from(".handoff.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/handoff/handoff.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("handoff").join("handoff.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Where persisted settings live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// JSON settings file
    pub path: PathBuf,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: data_dir().join("settings.json"),
        }
    }
}

/// Log output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG is unset
    pub level: String,

    /// Directory for log files
    pub dir: PathBuf,

    /// Log file name within `dir`
    #[serde(rename = "file-name")]
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: data_dir().join("logs"),
            file_name: "handoff.log".to_string(),
        }
    }
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("handoff")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.coordinator, CoordinatorConfig::default());
        assert_eq!(config.logging.level, "info");
        assert!(config.settings.path.ends_with("handoff/settings.json"));
    }

    #[test]
    fn test_load_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("handoff.yml");
        fs::write(
            &path,
            r#"
coordinator:
  dispatch-method: invokeRegionCallback
  blocking-timeout-ms: 5000
settings:
  path: /tmp/handoff-test/settings.json
logging:
  level: debug
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.coordinator.dispatch_method, "invokeRegionCallback");
        assert_eq!(config.coordinator.blocking_timeout_ms, Some(5000));
        assert_eq!(config.coordinator.initialized_method, "Dispatcher.initialized");
        assert_eq!(config.settings.path, PathBuf::from("/tmp/handoff-test/settings.json"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file_name, "handoff.log");
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.yml");

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }

    #[test]
    fn test_load_invalid_yaml_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.yml");
        fs::write(&path, "coordinator: [not, a, map]").unwrap();

        assert!(Config::load(Some(&path)).is_err());
    }
}

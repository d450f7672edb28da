//! Log setup for hosts embedding the coordinator

use std::fs;

use eyre::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install a file-backed tracing subscriber
///
/// Writes to `<dir>/<file-name>` without ANSI colours. `RUST_LOG` directives
/// are honoured; `level` applies on top of them. Fails if a global
/// subscriber is already installed.
pub fn setup_logging(config: &LoggingConfig) -> Result<()> {
    fs::create_dir_all(&config.dir).context("Failed to create log directory")?;

    let log_file = fs::File::create(config.dir.join(&config.file_name)).context("Failed to create log file")?;
    let directive = config
        .level
        .parse()
        .context(format!("Invalid log level: {}", config.level))?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to install log subscriber: {}", e))?;

    info!("Logging initialized (level: {})", config.level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_invalid_level_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config = LoggingConfig {
            level: "handoff=loud".to_string(),
            dir: temp_dir.path().to_path_buf(),
            file_name: "handoff.log".to_string(),
        };

        let err = setup_logging(&config).unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_creates_log_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = LoggingConfig {
            level: "debug".to_string(),
            dir: temp_dir.path().join("logs"),
            file_name: "handoff.log".to_string(),
        };

        // Another test may already own the global subscriber; the file is
        // created either way.
        let _ = setup_logging(&config);
        assert!(temp_dir.path().join("logs").join("handoff.log").exists());
    }
}

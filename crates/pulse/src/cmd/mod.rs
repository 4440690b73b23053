//! Command implementations for the Pulse CLI

pub mod archives;
pub mod serve;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pulse_config::Config;
use tracing::info;

/// Searched in order when no `--config` is given
const DEFAULT_CONFIG_PATHS: [&str; 2] = ["configs/pulse.toml", "pulse.toml"];

/// The config file that would be used, if any
///
/// An explicit path is never substituted by a default one.
pub fn discover_config(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists()),
    }
}

/// Load configuration; an explicit path must exist, otherwise defaults apply
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit
        && !path.exists()
    {
        return Err(anyhow::anyhow!("config file not found: {}", path.display()));
    }

    match discover_config(explicit) {
        Some(path) => {
            info!(config = %path.display(), "using config file");
            Config::from_file(&path).context("failed to load configuration")
        }
        None => {
            info!("no config file found, using defaults (HTTP on port 3100, file storage)");
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");

        assert!(discover_config(Some(&missing)).is_none());
        let err = load_config(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn test_explicit_config_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pulse.toml");
        std::fs::write(&path, "[server]\nport = 4100\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.server.port, 4100);
    }

    #[test]
    fn test_invalid_config_reports_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pulse.toml");
        std::fs::write(&path, "[server\nport = 1").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert_eq!(err.to_string(), "failed to load configuration");
    }
}

//! Application settings and paths.
//!
//! Manages the XDG config location and the JSON settings file stored there.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Port;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/sshsweep)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the configuration directory. Nothing is created on disk.
    pub fn resolve() -> ConfigResult<Self> {
        let project =
            ProjectDirs::from("com", "sshsweep", "sshsweep").ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Defaults applied when the corresponding flag is not given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Username tried on every target.
    pub user: String,
    /// Password tried on every target.
    pub password: String,
    /// Maximum probes in flight.
    pub workers: usize,
    /// Per-probe timeout in milliseconds.
    pub timeout_ms: u64,
    /// SSH port.
    pub port: Port,
    /// Probes started per second, 0 for unlimited.
    pub rate_limit: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            user: "test".to_string(),
            password: "123456".to_string(),
            workers: 100,
            timeout_ms: 3000,
            port: Port::SSH,
            rate_limit: 0,
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, falling back to defaults if
    /// no settings file exists.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::resolve()?.settings_file();
        if !file.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&file)
    }

    /// Load settings from a specific file. The file must exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    /// Save settings to a specific file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.user, "test");
        assert_eq!(settings.workers, 100);
        assert_eq!(settings.timeout(), Duration::from_secs(3));
        assert_eq!(settings.port, Port::SSH);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "user": "admin", "port": 2222 }"#).unwrap();

        let settings = AppSettings::load_from(&path).unwrap();
        assert_eq!(settings.user, "admin");
        assert_eq!(settings.port.as_u16(), 2222);
        assert_eq!(settings.password, "123456");
        assert_eq!(settings.workers, 100);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = AppSettings {
            workers: 250,
            rate_limit: 40,
            ..AppSettings::default()
        };

        settings.save_to(&path).unwrap();
        assert_eq!(AppSettings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "port": 0 }"#).unwrap();

        assert!(matches!(
            AppSettings::load_from(&path),
            Err(ConfigError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppSettings::load_from(&dir.path().join("absent.json")),
            Err(ConfigError::ReadFailed { .. })
        ));
    }
}

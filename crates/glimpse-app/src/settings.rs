//! Settings file loading.
//!
//! Settings live in a TOML file. An explicit `--config` path wins, otherwise
//! the platform config directory is consulted, and a missing file simply
//! yields the defaults.

use std::path::{Path, PathBuf};

use glimpse_common::SessionConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings read error: {0}")]
    Read(String),

    #[error("settings parse error: {0}")]
    Parse(String),
}

/// Application settings. Every field is optional in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL rendered into shareable join links.
    pub base_url: String,

    /// Session controller tuning.
    pub session: SessionConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            session: SessionConfig::default(),
        }
    }
}

/// Platform default location, e.g. `~/.config/glimpse/config.toml` on Linux.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("glimpse").join("config.toml"))
}

pub fn load_from_path(path: &Path) -> Result<Settings, SettingsError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| SettingsError::Read(format!("{}: {e}", path.display())))?;
    let settings = toml::from_str(&content)
        .map_err(|e| SettingsError::Parse(format!("{}: {e}", path.display())))?;
    info!("loaded settings from {}", path.display());
    Ok(settings)
}

/// Load settings from the override path if given, else the platform default.
/// Only an explicit override is allowed to fail on a missing file.
pub fn load(override_path: Option<&Path>) -> Result<Settings, SettingsError> {
    if let Some(path) = override_path {
        return load_from_path(path);
    }
    match default_settings_path() {
        Some(path) if path.exists() => load_from_path(&path),
        _ => Ok(Settings::default()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url = \"https://glimpse.example\"").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "[session]").unwrap();
        writeln!(file, "event_buffer = 32").unwrap();

        let settings = load_from_path(file.path()).unwrap();
        assert_eq!(settings.base_url, "https://glimpse.example");
        assert_eq!(settings.session.event_buffer, 32);
        assert_eq!(settings.session.command_buffer, SessionConfig::default().command_buffer);
        assert!(settings.session.capture.video);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url = [this is not toml").unwrap();

        let err = load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");

        let err = load(Some(&path)).unwrap_err();
        assert!(matches!(err, SettingsError::Read(_)));
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let rendered = toml::to_string(&Settings::default()).unwrap();
        let parsed: Settings = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.base_url, Settings::default().base_url);
        assert_eq!(parsed.session.command_buffer, SessionConfig::default().command_buffer);
    }
}

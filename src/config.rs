use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FeedError, Result};

// Default render window configuration
pub const DEFAULT_WINDOW_SIZE: usize = 400;
pub const DEFAULT_HALF_WINDOW: usize = 200;
pub const DEFAULT_MARGIN: usize = 50;

const SETTINGS_FILE: &str = "feed.json";

/// Tunables for the message feed's render window.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct FeedSettings {
    /// Maximum number of messages materialized at once
    pub window_size: usize,
    /// Distance from the selection to the window start after a recentre
    pub half_window: usize,
    /// How close the selection may get to a window edge before it moves
    pub margin: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            half_window: DEFAULT_HALF_WINDOW,
            margin: DEFAULT_MARGIN,
        }
    }
}

impl FeedSettings {
    /// Check that a recentred window can never immediately retrigger a move.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(FeedError::InvalidSettings(
                "window_size must be greater than zero".to_string(),
            ));
        }
        if self.margin > self.half_window {
            return Err(FeedError::InvalidSettings(format!(
                "margin ({}) must not exceed half_window ({})",
                self.margin, self.half_window
            )));
        }
        if self.half_window + self.margin >= self.window_size {
            return Err(FeedError::InvalidSettings(format!(
                "half_window + margin ({}) must be less than window_size ({})",
                self.half_window + self.margin,
                self.window_size
            )));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }
}

pub fn settings_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("com", "chatfeed", "chatfeed")?;
    Some(proj.config_dir().join(SETTINGS_FILE))
}

/// Load settings from an explicit file. A missing file yields the defaults.
pub fn load_settings_from(path: &Path) -> Result<FeedSettings> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no feed settings file, using defaults");
        return Ok(FeedSettings::default());
    }
    let content = fs::read_to_string(path)?;
    FeedSettings::from_json_str(&content)
}

/// Load settings from the platform config directory.
pub fn load_settings() -> Result<FeedSettings> {
    match settings_path() {
        Some(path) => load_settings_from(&path),
        None => Ok(FeedSettings::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = FeedSettings::default();
        assert_eq!(settings.window_size, 400);
        assert_eq!(settings.half_window, 200);
        assert_eq!(settings.margin, 50);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = FeedSettings::from_json_str(r#"{"margin": 20}"#).unwrap();
        assert_eq!(settings.margin, 20);
        assert_eq!(settings.window_size, DEFAULT_WINDOW_SIZE);
        assert_eq!(settings.half_window, DEFAULT_HALF_WINDOW);
    }

    #[test]
    fn test_rejects_unstable_window() {
        let json = r#"{"window_size": 100, "half_window": 60, "margin": 50}"#;
        let err = FeedSettings::from_json_str(json).unwrap_err();
        assert!(matches!(err, FeedError::InvalidSettings(_)));

        let json = r#"{"half_window": 10, "margin": 50}"#;
        let err = FeedSettings::from_json_str(json).unwrap_err();
        assert!(matches!(err, FeedError::InvalidSettings(_)));

        let err = FeedSettings::from_json_str(r#"{"window_size": 0}"#).unwrap_err();
        assert!(matches!(err, FeedError::InvalidSettings(_)));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = FeedSettings::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)));
    }

    #[test]
    fn test_load_settings_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.json");

        // Missing file falls back to defaults
        assert_eq!(load_settings_from(&path).unwrap(), FeedSettings::default());

        let mut file = fs::File::create(&path).unwrap();
        let json = br#"{"window_size": 100, "half_window": 50, "margin": 10}"#;
        file.write_all(json).unwrap();
        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.window_size, 100);
        assert_eq!(settings.half_window, 50);
        assert_eq!(settings.margin, 10);
    }

    #[test]
    fn test_settings_path_names_file() {
        if let Some(path) = settings_path() {
            assert!(path.ends_with(SETTINGS_FILE));
        }
    }
}

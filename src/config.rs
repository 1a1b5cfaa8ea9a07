//! Configuration file handling for chafa-draw.
//!
//! Loads configuration from `~/.config/chafa-draw/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::quality::{QualityOptions, QualityPreset};

/// Configuration file structure for chafa-draw.
/// Loaded from ~/.config/chafa-draw/config.toml (or a custom path).
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub quality: QualitySection,
    #[serde(default)]
    pub session: SessionSection,
}

/// `[quality]` section: preset plus per-field overrides.
#[derive(Debug, Deserialize, Default)]
pub struct QualitySection {
    #[serde(default)]
    pub preset: Option<QualityPreset>,
    #[serde(default)]
    pub work_factor: Option<f32>,
    #[serde(default)]
    pub dithering: Option<bool>,
}

/// `[session]` section: display session overrides.
#[derive(Debug, Deserialize, Default)]
pub struct SessionSection {
    /// Force the X11 flag instead of reading XDG_SESSION_TYPE
    #[serde(default)]
    pub x11: Option<bool>,
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            let config: Config =
                toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Effective quality options for this configuration.
    pub fn quality_options(&self) -> QualityOptions {
        QualityOptions::resolve(
            self.quality.preset,
            self.quality.work_factor,
            self.quality.dithering,
        )
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("chafa-draw").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/chafa-draw/config.toml")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.quality.preset.is_none());
        assert!(config.session.x11.is_none());
        assert_eq!(config.quality_options(), QualityOptions::default());
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            [quality]
            preset = "medium"
            work_factor = 0.8

            [session]
            x11 = true
            "#,
        )
        .unwrap();
        assert_eq!(config.quality.preset, Some(QualityPreset::Medium));
        assert_eq!(config.quality.work_factor, Some(0.8));
        assert_eq!(config.session.x11, Some(true));

        let options = config.quality_options();
        assert_eq!(options.work_factor, 0.8);
        assert!(options.dithering);
        assert!(!options.preprocessing);
    }

    #[test]
    fn test_default_path_ends_with_config_toml() {
        assert!(default_path().ends_with("chafa-draw/config.toml"));
    }
}

//! Configuration management for Yomikomi.
//!
//! Handles loading, saving, and validating configuration from
//! platform-specific config directories. The reader core only ever
//! reads the preferences stored here.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Application name used for config directory.
const APP_NAME: &str = "Yomikomi";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Upper bound for the delay between catalog requests, in seconds.
const MAX_REQUEST_DELAY_SEC: f64 = 3600.0;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog service settings.
    pub source: SourceConfig,

    /// Persisted user preferences.
    pub preferences: Preferences,

    /// Reader view settings.
    pub reader: ReaderConfig,
}

/// Catalog service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL of the catalog API.
    pub api_url: String,

    /// Use reduced-quality page images to save bandwidth.
    pub data_saver: bool,

    /// Delay between API requests in seconds.
    pub delay_between_requests_sec: f64,

    /// HTTP request timeout in seconds.
    pub request_timeout_sec: u64,

    /// Enable debug logging.
    pub debug: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.mangadex.org".to_string(),
            data_saver: true,
            delay_between_requests_sec: 0.0,
            request_timeout_sec: 30,
            debug: false,
        }
    }
}

/// Chapter listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterOrder {
    Asc,
    #[default]
    Desc,
}

impl ChapterOrder {
    /// Value used in catalog query strings.
    pub fn as_str(self) -> &'static str {
        match self {
            ChapterOrder::Asc => "asc",
            ChapterOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for ChapterOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Color theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// User preferences persisted alongside the configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Translated language filter, e.g. "en", "pt-br", "ja".
    pub language: String,

    /// Sort order for chapter listings.
    pub chapter_order: ChapterOrder,

    /// Color theme.
    pub theme: Theme,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            chapter_order: ChapterOrder::Desc,
            theme: Theme::System,
        }
    }
}

impl Preferences {
    /// Returns the language filter, or `None` when left blank.
    pub fn language_filter(&self) -> Option<&str> {
        let lang = self.language.trim();
        (!lang.is_empty()).then_some(lang)
    }
}

/// Reader view configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Width of the viewing surface used to classify taps.
    pub viewport_width: f64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            viewport_width: 100.0,
        }
    }
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if url::Url::parse(&self.source.api_url).is_err() {
            return Err(ConfigError::InvalidValue {
                key: "source.api_url".to_string(),
                message: format!("'{}' is not a valid URL", self.source.api_url),
            });
        }

        let delay = self.source.delay_between_requests_sec;
        if !(0.0..=MAX_REQUEST_DELAY_SEC).contains(&delay) {
            return Err(ConfigError::InvalidValue {
                key: "source.delay_between_requests_sec".to_string(),
                message: format!("must be between 0 and {}", MAX_REQUEST_DELAY_SEC),
            });
        }

        if !(self.reader.viewport_width.is_finite() && self.reader.viewport_width > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "reader.viewport_width".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, tempdir};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.source.api_url, "https://api.mangadex.org");
        assert!(config.source.data_saver);
        assert_eq!(config.preferences.language, "en");
        assert_eq!(config.preferences.chapter_order, ChapterOrder::Desc);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_round_trip() {
        let mut config = Config::default();
        config.preferences.language = "pt-br".to_string();
        config.preferences.chapter_order = ChapterOrder::Asc;
        let file = NamedTempFile::new().unwrap();

        config.save_to(file.path()).unwrap();

        let loaded = Config::load_from(file.path()).unwrap();
        assert_eq!(loaded.preferences.language, "pt-br");
        assert_eq!(loaded.preferences.chapter_order, ChapterOrder::Asc);
        assert_eq!(loaded.source.api_url, config.source.api_url);
    }

    #[test]
    fn test_missing_file_creates_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILENAME);

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.preferences.theme, Theme::System);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[preferences]\nlanguage = \"ja\"\n").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.preferences.language, "ja");
        assert_eq!(config.preferences.chapter_order, ChapterOrder::Desc);
        assert_eq!(config.source.request_timeout_sec, 30);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.source.api_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.reader.viewport_width = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_request_delay_must_be_bounded() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[source]\ndelay_between_requests_sec = inf\n").unwrap();
        let config = Config::load_from(file.path()).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert!(err.to_string().contains("delay_between_requests_sec"));

        let mut config = Config::default();
        for delay in [-1.0, 1e30, f64::NAN] {
            config.source.delay_between_requests_sec = delay;
            assert!(config.validate().is_err(), "delay {} accepted", delay);
        }

        config.source.delay_between_requests_sec = 1.5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_language_means_no_filter() {
        let mut prefs = Preferences::default();
        assert_eq!(prefs.language_filter(), Some("en"));

        prefs.language = "  ".to_string();
        assert_eq!(prefs.language_filter(), None);
    }
}

//! Configuration file support for the segmenter.
//!
//! Settings are persisted as JSON: the last used directories, brush and
//! overlay preferences, refinement iterations, log level and the label
//! categories.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BRUSH_RADIUS, DEFAULT_MASK_OPACITY, DEFAULT_REFINE_ITERATIONS, MAX_BRUSH_RADIUS,
    MIN_BRUSH_RADIUS,
};
use crate::model::{LabelCategory, default_categories};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Get the display name for this log level.
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Persisted application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Editor preferences
    #[serde(default)]
    pub preferences: EditorPreferences,

    /// Label categories in display order
    #[serde(default = "default_categories")]
    pub categories: Vec<LabelCategory>,
}

/// Editor preferences section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorPreferences {
    /// Image directory opened last
    #[serde(default)]
    pub last_image_dir: Option<PathBuf>,

    /// Label directory chosen last
    #[serde(default)]
    pub last_label_dir: Option<PathBuf>,

    /// Brush radius in image pixels
    #[serde(default = "default_brush_radius")]
    pub brush_radius: f32,

    /// Mask overlay opacity (0.0 - 1.0)
    #[serde(default = "default_mask_opacity")]
    pub mask_opacity: f32,

    /// GrabCut iterations per refinement
    #[serde(default = "default_refine_iterations")]
    pub refine_iterations: usize,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_brush_radius() -> f32 {
    DEFAULT_BRUSH_RADIUS
}

fn default_mask_opacity() -> f32 {
    DEFAULT_MASK_OPACITY
}

fn default_refine_iterations() -> usize {
    DEFAULT_REFINE_ITERATIONS
}

impl Default for EditorPreferences {
    fn default() -> Self {
        Self {
            last_image_dir: None,
            last_label_dir: None,
            brush_radius: default_brush_radius(),
            mask_opacity: default_mask_opacity(),
            refine_iterations: default_refine_iterations(),
            log_level: LogLevel::default(),
        }
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            preferences: EditorPreferences::default(),
            categories: default_categories(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    ///
    /// Out-of-range values are clamped and an empty category list falls back
    /// to the defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        let prefs = &mut config.preferences;
        prefs.brush_radius = prefs.brush_radius.clamp(MIN_BRUSH_RADIUS, MAX_BRUSH_RADIUS);
        prefs.mask_opacity = prefs.mask_opacity.clamp(0.0, 1.0);
        prefs.refine_iterations = prefs.refine_iterations.max(1);
        if config.categories.is_empty() {
            config.categories = default_categories();
        }
        Ok(config)
    }

    /// Get the default config filename.
    pub fn default_filename() -> &'static str {
        "segmenter-config.json"
    }

    /// Get the default config file path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("segmenter").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("segmenter")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load_from(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to the default path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save_to(&path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.preferences.brush_radius, 4.0);
        assert_eq!(config.preferences.mask_opacity, 0.5);
        assert_eq!(config.preferences.refine_iterations, 2);
        assert_eq!(config.categories.len(), 3);
        assert!(config.preferences.last_image_dir.is_none());
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = AppConfig::new();
        config.preferences.last_image_dir = Some(PathBuf::from("/data/images"));
        config.preferences.log_level = LogLevel::Debug;
        config.categories.push(LabelCategory::new("Heel"));

        let json = config.to_json().unwrap();
        assert!(json.contains("\"debug\""));
        assert_eq!(AppConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = AppConfig::from_json(r#"{"version": 1}"#).unwrap();
        assert_eq!(config.preferences, EditorPreferences::default());
        assert_eq!(config.categories, default_categories());
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let json = r#"{
            "version": 1,
            "preferences": {"brush_radius": 500.0, "mask_opacity": -1.0, "refine_iterations": 0},
            "categories": []
        }"#;
        let config = AppConfig::from_json(json).unwrap();
        assert_eq!(config.preferences.brush_radius, MAX_BRUSH_RADIUS);
        assert_eq!(config.preferences.mask_opacity, 0.0);
        assert_eq!(config.preferences.refine_iterations, 1);
        assert_eq!(config.categories.len(), 3);
    }

    #[test]
    fn test_newer_version_rejected() {
        let json = format!(r#"{{"version": {}}}"#, CONFIG_VERSION + 1);
        assert!(matches!(
            AppConfig::from_json(&json),
            Err(ConfigError::VersionTooNew { .. })
        ));
    }

    #[test]
    fn test_save_and_load_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("segmenter-config.json");
        let mut config = AppConfig::new();
        config.preferences.mask_opacity = 0.8;

        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_level_filter() {
        assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
        assert_eq!(LogLevel::default().name(), "Info");
    }
}

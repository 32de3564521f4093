//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Explicit overrides set by the embedding application
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. `$OUTLINER_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/outliner/config.toml`
//! 3. `~/.outliner/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use outliner::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! let engine = config.engine_settings();
//! println!("verify writes: {}", engine.verify_writes);
//! println!("leaf label: {}", config.export_settings().leaf_label);
//! ```

pub mod schema;

pub use schema::{EngineSection, ExportSection, FileConfig, LoggingSection};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "OUTLINER_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Resolved ordering engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Re-read affected sibling groups after each write and fail with
    /// `InvariantViolation` if they are not contiguous.
    pub verify_writes: bool,
    /// Maximum wait for a sibling-group lock.
    pub lock_timeout: Duration,
    /// Attempts at locking the group of a node that keeps moving.
    pub lock_retries: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            verify_writes: true,
            lock_timeout: Duration::from_millis(5000),
            lock_retries: 8,
        }
    }
}

/// Resolved document export settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSettings {
    pub font: String,
    pub body_size: u32,
    pub title_size: u32,
    pub fallback_size: u32,
    pub indent_twips: u32,
    pub hanging_twips: u32,
    pub leaf_label: String,
    pub citation_label: String,
    pub annotation_prefix: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            font: "Arial".into(),
            body_size: 24,
            title_size: 32,
            fallback_size: 20,
            indent_twips: 720,
            hanging_twips: 360,
            leaf_label: "Paragraph".into(),
            citation_label: "Reference".into(),
            annotation_prefix: "Paper".into(),
        }
    }
}

/// Loaded configuration.
///
/// Accessors apply defaults for anything the file leaves out.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents (all defaults if no file was found)
    pub file: FileConfig,
    /// Path the file was loaded from
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// fails validation. A missing file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::locate() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(Self {
            file,
            loaded_from: Some(path.to_path_buf()),
        })
    }

    /// Find the first existing config file in search order.
    fn locate() -> Option<PathBuf> {
        // 1. Check $OUTLINER_CONFIG
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/outliner/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("outliner/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.outliner/config.toml
        dirs::home_dir()
            .map(|home| home.join(".outliner/config.toml"))
            .filter(|path| path.exists())
    }

    /// Get the canonical path for the config file.
    ///
    /// Returns `~/.outliner/config.toml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".outliner/config.toml"))
    }

    /// Write a config file atomically.
    ///
    /// Creates parent directories if needed and writes through a temp
    /// file plus rename so readers never see a partial file.
    pub fn write_to(path: &Path, file: &FileConfig) -> Result<(), ConfigError> {
        file.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(file).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut handle = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;
        handle
            .write_all(contents.as_bytes())
            .and_then(|()| handle.sync_all())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Resolved engine settings.
    pub fn engine_settings(&self) -> EngineSettings {
        let defaults = EngineSettings::default();
        let Some(section) = &self.file.engine else {
            return defaults;
        };
        EngineSettings {
            verify_writes: section.verify_writes.unwrap_or(defaults.verify_writes),
            lock_timeout: section
                .lock_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.lock_timeout),
            lock_retries: section.lock_retries.unwrap_or(defaults.lock_retries),
        }
    }

    /// Resolved export settings.
    pub fn export_settings(&self) -> ExportSettings {
        let defaults = ExportSettings::default();
        let Some(section) = &self.file.export else {
            return defaults;
        };
        ExportSettings {
            font: section.font.clone().unwrap_or(defaults.font),
            body_size: section.body_size.unwrap_or(defaults.body_size),
            title_size: section.title_size.unwrap_or(defaults.title_size),
            fallback_size: section.fallback_size.unwrap_or(defaults.fallback_size),
            indent_twips: section.indent_twips.unwrap_or(defaults.indent_twips),
            hanging_twips: section.hanging_twips.unwrap_or(defaults.hanging_twips),
            leaf_label: section.leaf_label.clone().unwrap_or(defaults.leaf_label),
            citation_label: section
                .citation_label
                .clone()
                .unwrap_or(defaults.citation_label),
            annotation_prefix: section
                .annotation_prefix
                .clone()
                .unwrap_or(defaults.annotation_prefix),
        }
    }

    /// Log filter directive, if configured.
    pub fn log_filter(&self) -> Option<&str> {
        self.file.logging.as_ref().and_then(|l| l.filter.as_deref())
    }

    /// Get the path the config was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}

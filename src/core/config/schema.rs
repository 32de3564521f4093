//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Location
//!
//! Searched in order:
//! 1. `$OUTLINER_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/outliner/config.toml`
//! 3. `~/.outliner/config.toml` (canonical write location)
//!
//! # Validation
//!
//! Config values are validated after parsing (e.g. font sizes must be
//! positive, label words must be non-empty).

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// On-disk configuration.
///
/// Every value is optional; accessors on [`super::Config`] apply defaults.
///
/// # Example
///
/// ```toml
/// [engine]
/// verify_writes = true
/// lock_timeout_ms = 5000
///
/// [export]
/// font = "Arial"
/// leaf_label = "Paragraph"
///
/// [logging]
/// filter = "outliner=debug"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Ordering engine settings
    pub engine: Option<EngineSection>,

    /// Document export settings
    pub export: Option<ExportSection>,

    /// Log filter settings
    pub logging: Option<LoggingSection>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(engine) = &self.engine {
            engine.validate()?;
        }
        if let Some(export) = &self.export {
            export.validate()?;
        }
        Ok(())
    }
}

/// `[engine]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSection {
    /// Re-read and check sibling groups after every write
    pub verify_writes: Option<bool>,

    /// How long to wait for a sibling-group lock
    pub lock_timeout_ms: Option<u64>,

    /// How often to retry when a node moves while its group is being locked
    pub lock_retries: Option<u32>,
}

impl EngineSection {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.lock_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue(
                "engine.lock_timeout_ms must be positive".into(),
            ));
        }
        if self.lock_retries == Some(0) {
            return Err(ConfigError::InvalidValue(
                "engine.lock_retries must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Largest accepted indent, in twips (22 inches).
pub const MAX_TWIPS: u32 = 31_680;

/// `[export]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ExportSection {
    pub font: Option<String>,
    /// Font sizes in half-points
    pub body_size: Option<u32>,
    pub title_size: Option<u32>,
    pub fallback_size: Option<u32>,
    /// Indent per level, in twips
    pub indent_twips: Option<u32>,
    /// Hanging indent for numbered sections, in twips
    pub hanging_twips: Option<u32>,
    pub leaf_label: Option<String>,
    pub citation_label: Option<String>,
    pub annotation_prefix: Option<String>,
}

impl ExportSection {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, size) in [
            ("body_size", self.body_size),
            ("title_size", self.title_size),
            ("fallback_size", self.fallback_size),
        ] {
            if size == Some(0) {
                return Err(ConfigError::InvalidValue(format!(
                    "export.{name} must be positive"
                )));
            }
        }

        for (name, value) in [
            ("font", &self.font),
            ("leaf_label", &self.leaf_label),
            ("citation_label", &self.citation_label),
            ("annotation_prefix", &self.annotation_prefix),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ConfigError::InvalidValue(format!(
                    "export.{name} cannot be empty"
                )));
            }
        }

        for (name, twips) in [
            ("indent_twips", self.indent_twips),
            ("hanging_twips", self.hanging_twips),
        ] {
            if twips.is_some_and(|t| t > MAX_TWIPS) {
                return Err(ConfigError::InvalidValue(format!(
                    "export.{name} must be at most {MAX_TWIPS}"
                )));
            }
        }

        if let Some(font) = &self.font {
            if font.contains(['{', '}', '\\', ';']) {
                return Err(ConfigError::InvalidValue(format!(
                    "export.font contains reserved characters: {font}"
                )));
            }
        }
        Ok(())
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// An `EnvFilter` directive string, e.g. `"outliner=debug"`
    pub filter: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_file() {
        let config: FileConfig = toml::from_str(
            r#"
            [engine]
            verify_writes = false
            lock_timeout_ms = 250

            [export]
            font = "Times New Roman"
            leaf_label = "Para"

            [logging]
            filter = "outliner=trace"
            "#,
        )
        .unwrap();

        let engine = config.engine.as_ref().unwrap();
        assert_eq!(engine.verify_writes, Some(false));
        assert_eq!(engine.lock_timeout_ms, Some(250));
        assert_eq!(
            config.export.as_ref().unwrap().leaf_label.as_deref(),
            Some("Para")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_timeout_rejected() {
        let config: FileConfig = toml::from_str("[engine]\nlock_timeout_ms = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_label_rejected() {
        let config: FileConfig = toml::from_str("[export]\nleaf_label = \"  \"").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn font_with_rtf_control_chars_rejected() {
        let config: FileConfig = toml::from_str("[export]\nfont = \"Ari{al\"").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_indent_rejected() {
        let config: FileConfig = toml::from_str("[export]\nindent_twips = 4000000000").unwrap();
        assert!(config.validate().is_err());
        let config: FileConfig = toml::from_str("[export]\nindent_twips = 31680").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_section_rejected() {
        assert!(toml::from_str::<FileConfig>("[forge]\nname = \"github\"").is_err());
    }
}

//! Configuration types and loading.
//!
//! The main entry point is [`OnTaskConfig`]. Configuration is loaded with
//! [`load_config`] and saved with [`save_config`].

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use ontask_formula::PlaceholderStyle;
use ontask_template::RenderOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("failed to access config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// The configuration could not be serialized as YAML.
    #[error("failed to serialize config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// A layer (file or environment) held an invalid value.
    #[error("invalid configuration: {0}")]
    Extract(#[from] Box<figment::Error>),
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Template rendering section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Treat action text as HTML (auto-escape output, escape context keys).
    pub html: bool,
    /// Fail on references to unknown variables.
    pub strict_undefined: bool,
    pub keep_trailing_newline: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let options = RenderOptions::default();
        Self {
            html: options.html,
            strict_undefined: options.strict_undefined,
            keep_trailing_newline: options.keep_trailing_newline,
        }
    }
}

impl RenderConfig {
    pub fn options(&self) -> RenderOptions {
        RenderOptions {
            html: self.html,
            strict_undefined: self.strict_undefined,
            keep_trailing_newline: self.keep_trailing_newline,
        }
    }
}

/// SQL compilation section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SqlConfig {
    /// Placeholder syntax used when printing compiled filters.
    pub placeholder: PlaceholderStyle,
}

/// Logging section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `"ontask_action=debug"`.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OnTaskConfig {
    pub render: RenderConfig,
    pub sql: SqlConfig,
    pub log: LogConfig,
}

impl OnTaskConfig {
    /// Rendering options for the template renderer.
    pub fn render_options(&self) -> RenderOptions {
        self.render.options()
    }

    /// Placeholder style for printed SQL predicates.
    pub fn placeholder_style(&self) -> PlaceholderStyle {
        self.sql.placeholder
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// The layered provider stack: defaults, the YAML file at `path` (skipped
/// when absent or empty), then the environment.
pub fn layered(path: Option<&Path>) -> Figment {
    let mut fig = Figment::from(Serialized::defaults(OnTaskConfig::default()));
    if let Some(path) = path {
        let non_empty = std::fs::metadata(path).is_ok_and(|m| m.len() > 0);
        if non_empty {
            fig = fig.merge(Yaml::file(path));
        }
    }
    fig.merge(Env::prefixed("ONTASK_").split("__"))
}

/// Loads configuration from `path` (if given) and the environment.
///
/// A missing or empty file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<OnTaskConfig> {
    layered(path).extract().map_err(|e| ConfigError::Extract(Box::new(e)))
}

/// Saves configuration as YAML, creating parent directories.
pub fn save_config(path: &Path, config: &OnTaskConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let cfg = OnTaskConfig::default();
        assert!(cfg.render.html);
        assert!(!cfg.render.strict_undefined);
        assert_eq!(cfg.sql.placeholder, PlaceholderStyle::Question);
        assert_eq!(cfg.log.filter, "warn");
        assert_eq!(cfg.render_options(), RenderOptions::default());
    }

    #[test]
    fn test_load_missing_config_returns_default() {
        let path = PathBuf::from("/nonexistent/path/ontask.yaml");
        let cfg = load_config(Some(path.as_path())).unwrap();
        assert_eq!(cfg.sql, SqlConfig::default());
        assert_eq!(cfg.render, RenderConfig::default());
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ontask.yaml");
        std::fs::write(&path, "render:\n  html: false\nsql:\n  placeholder: format\n").unwrap();

        let cfg = load_config(Some(path.as_path())).unwrap();
        assert!(!cfg.render.html);
        assert!(cfg.render.keep_trailing_newline);
        assert_eq!(cfg.placeholder_style(), PlaceholderStyle::Format);
    }

    #[test]
    fn test_empty_file_returns_default() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.log, LogConfig::default());
    }

    #[test]
    fn test_invalid_value_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ontask.yaml");
        std::fs::write(&path, "sql:\n  placeholder: dollar\n").unwrap();
        assert!(matches!(load_config(Some(path.as_path())), Err(ConfigError::Extract(_))));
    }

    #[test]
    fn test_roundtrip_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ontask.yaml");

        let mut cfg = OnTaskConfig::default();
        cfg.render.strict_undefined = true;
        cfg.log.filter = "ontask_action=debug".to_string();

        save_config(&path, &cfg).unwrap();
        let loaded = load_config(Some(path.as_path())).unwrap();
        assert_eq!(loaded, cfg);
    }
}

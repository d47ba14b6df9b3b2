//! Configuration management for the OnTask engine.
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! `ONTASK_`-prefixed environment variables (nested keys separated by `__`,
//! e.g. `ONTASK_RENDER__HTML=false`).

pub mod config;

pub use config::{
    layered, load_config, save_config, ConfigError, LogConfig, OnTaskConfig, RenderConfig, Result,
    SqlConfig,
};

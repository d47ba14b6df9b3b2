//! Runtime context for command execution.

use anyhow::{Context, Result};
use ontask_config::{load_config, OnTaskConfig};

use crate::cli::GlobalArgs;

/// Runtime context passed to every command handler.
///
/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Loaded configuration (defaults, file, then `ONTASK_*` environment).
    pub config: OnTaskConfig,

    /// Whether to produce JSON output.
    pub json: bool,

    /// Verbose output.
    pub verbose: bool,
}

impl RuntimeContext {
    /// Build a `RuntimeContext` from parsed global arguments.
    pub fn from_global_args(global: &GlobalArgs) -> Result<Self> {
        let config = load_config(global.config.as_deref()).with_context(|| match &global.config {
            Some(path) => format!("failed to load config from {}", path.display()),
            None => "failed to load config".to_string(),
        })?;
        Ok(Self {
            config,
            json: global.json,
            verbose: global.verbose,
        })
    }

    /// `EnvFilter` directive: `--verbose` wins over the configured filter.
    pub fn log_filter(&self) -> String {
        if self.verbose {
            "ot=debug,ontask_action=debug,ontask_storage=debug,ontask_template=debug".to_string()
        } else {
            self.config.log.filter.clone()
        }
    }
}

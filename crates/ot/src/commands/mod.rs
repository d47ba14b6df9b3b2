//! Command handlers, one module per subcommand.

pub mod count;
pub mod formula;
pub mod preview;
pub mod run;
pub mod translate;

use std::path::Path;

use anyhow::{Context, Result};
use ontask_action::{Action, Workflow};
use ontask_storage::SqliteStore;

use crate::cli::SourceArgs;

/// A workflow together with an in-memory store holding its rows.
pub struct Loaded {
    pub workflow: Workflow,
    pub store: SqliteStore,
}

impl Loaded {
    /// The action named on the command line, or the first one.
    pub fn action(&self, name: Option<&str>) -> Result<&Action> {
        match name {
            Some(name) => self
                .workflow
                .action(name)
                .with_context(|| format!("workflow has no action named {name:?}")),
            None => self
                .workflow
                .actions
                .first()
                .context("workflow defines no actions"),
        }
    }
}

/// Reads a workflow description. YAML is a superset of JSON, so both parse.
pub fn load_workflow(path: &Path) -> Result<Workflow> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read workflow: {}", path.display()))?;
    let workflow: Workflow = serde_yaml::from_str(&text)
        .with_context(|| format!("invalid workflow: {}", path.display()))?;
    workflow.validate_names()?;
    Ok(workflow)
}

/// Loads the workflow and its rows into a fresh in-memory store.
pub fn load_source(source: &SourceArgs) -> Result<Loaded> {
    let workflow = load_workflow(&source.workflow)?;
    let rows = std::fs::read_to_string(&source.rows)
        .with_context(|| format!("failed to read rows: {}", source.rows.display()))?;

    let store = SqliteStore::open_in_memory()?;
    let n = store
        .import_json_rows(workflow.id, &workflow.columns, &rows)
        .with_context(|| format!("failed to load rows from {}", source.rows.display()))?;
    tracing::debug!(workflow = workflow.id, rows = n, "loaded rows");

    Ok(Loaded { workflow, store })
}

//! `ot count` -- rows selected by each condition of an action.

use anyhow::Result;
use ontask_action::update_n_rows_selected;

use crate::cli::CountArgs;
use crate::commands::load_source;
use crate::context::RuntimeContext;
use crate::output::{output_json, output_pairs};

/// Execute the `ot count` command.
pub fn run(ctx: &RuntimeContext, args: &CountArgs) -> Result<()> {
    let loaded = load_source(&args.source)?;
    let mut action = loaded.action(args.source.action.as_deref())?.clone();
    update_n_rows_selected(&mut action, &loaded.store, loaded.workflow.id)?;

    let counts: Vec<(String, usize)> = action
        .conditions
        .iter()
        .map(|c| (c.name.clone(), c.n_rows_selected.unwrap_or_default()))
        .collect();

    if ctx.json {
        let map: serde_json::Map<String, serde_json::Value> = counts
            .into_iter()
            .map(|(k, v)| (k, serde_json::Value::from(v)))
            .collect();
        output_json(&map);
    } else {
        output_pairs(&counts);
    }
    Ok(())
}

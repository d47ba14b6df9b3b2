//! `ot run` -- render an action for every selected row.

use anyhow::Result;
use ontask_action::{evaluate_action, EvaluateOptions};

use crate::cli::RunArgs;
use crate::commands::load_source;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `ot run` command.
///
/// Output is always a JSON array with one `[body, subject?, key?]` entry
/// per row.
pub fn run(ctx: &RuntimeContext, args: &RunArgs) -> Result<()> {
    let loaded = load_source(&args.source)?;
    let action = loaded.action(args.source.action.as_deref())?;

    let options = EvaluateOptions {
        extra_text: args.subject.clone(),
        key_column: args.key_column.clone(),
        exclude_values: args.exclude.clone(),
        render: ctx.config.render_options(),
    };
    let records = evaluate_action(&loaded.workflow, action, &loaded.store, &options)?;
    output_json(&records);
    Ok(())
}

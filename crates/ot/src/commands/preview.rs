//! `ot preview` -- render an action for one row.

use anyhow::{bail, Context, Result};
use ontask_action::{
    build_row_context, evaluate_row_action_in, evaluate_row_action_out, get_row_values,
    RowSelector,
};
use ontask_core::Value;

use crate::cli::PreviewArgs;
use crate::commands::{load_source, Loaded};
use crate::context::RuntimeContext;
use crate::output::{output_json, output_pairs};

/// Execute the `ot preview` command.
pub fn run(ctx: &RuntimeContext, args: &PreviewArgs) -> Result<()> {
    let loaded = load_source(&args.source)?;
    let action = loaded.action(args.source.action.as_deref())?;
    let selector = selector(&loaded, args)?;

    let row = get_row_values(&loaded.workflow, action, &loaded.store, &selector)?;
    let Some(row) = row else {
        bail!("no selected row matches {}", describe(&selector));
    };

    if action.is_in() {
        let values = evaluate_row_action_in(action, &row)?;
        if ctx.json {
            let map: serde_json::Map<String, serde_json::Value> = values
                .into_iter()
                .map(|(k, v)| -> Result<(String, serde_json::Value)> {
                    Ok((k, serde_json::to_value(v)?))
                })
                .collect::<Result<_>>()?;
            output_json(&map);
        } else {
            output_pairs(&values);
        }
        return Ok(());
    }

    let context = build_row_context(&loaded.workflow, action, row)?;
    let text = evaluate_row_action_out(
        action,
        Some(&context),
        args.text.as_deref(),
        &ctx.config.render_options(),
    )?
    .unwrap_or_default();

    if ctx.json {
        output_json(&serde_json::json!({ "action": action.name, "text": text }));
    } else {
        println!("{text}");
    }
    Ok(())
}

fn selector(loaded: &Loaded, args: &PreviewArgs) -> Result<RowSelector> {
    match (&args.key, &args.key_column) {
        (Some(key), Some(column)) => {
            let declared = loaded
                .workflow
                .column(column)
                .with_context(|| format!("workflow has no column named {column:?}"))?;
            let value = declared
                .data_type
                .coerce(&Value::from(key.as_str()))
                .with_context(|| format!("{key:?} is not a valid {}", declared.data_type))?;
            Ok(RowSelector::Key {
                column: column.clone(),
                value,
            })
        }
        _ => Ok(RowSelector::Index(args.index.unwrap_or(1))),
    }
}

fn describe(selector: &RowSelector) -> String {
    match selector {
        RowSelector::Index(i) => format!("index {i}"),
        RowSelector::Key { column, value } => format!("{column} = {value}"),
    }
}

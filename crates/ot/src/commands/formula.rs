//! `ot formula` -- evaluate a rule-builder formula.

use anyhow::{Context, Result};
use ontask_core::Context as Variables;
use ontask_formula::{evaluate, parse_json, EvalMode, Evaluation};

use crate::cli::{FormulaArgs, ModeArg};
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `ot formula` command.
pub fn run(ctx: &RuntimeContext, args: &FormulaArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.formula)
        .with_context(|| format!("failed to read formula: {}", args.formula.display()))?;
    let formula = parse_json(&text)
        .with_context(|| format!("invalid formula: {}", args.formula.display()))?;

    let variables: Option<Variables> = match &args.context {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read context: {}", path.display()))?;
            Some(
                serde_json::from_str(&raw)
                    .with_context(|| format!("context must be a JSON object: {}", path.display()))?,
            )
        }
        None => None,
    };

    let result = match args.mode {
        ModeArg::Bool => evaluate(&formula, EvalMode::Boolean, variables.as_ref())?,
        ModeArg::Text => evaluate(&formula, EvalMode::Text, None)?,
        ModeArg::Sql => Evaluation::Sql(ontask_formula::to_sql(
            &formula,
            ctx.config.placeholder_style(),
        )?),
    };

    match result {
        Evaluation::Bool(b) => {
            if ctx.json {
                output_json(&serde_json::json!({ "result": b }));
            } else {
                println!("{b}");
            }
        }
        Evaluation::Sql(predicate) => {
            if ctx.json {
                output_json(&serde_json::json!({
                    "sql": predicate.sql,
                    "params": predicate.params,
                }));
            } else {
                println!("{}", predicate.sql);
                for (i, param) in predicate.params.iter().enumerate() {
                    println!("  ${} = {}", i + 1, serde_json::to_string(param)?);
                }
            }
        }
        Evaluation::Text(text) => {
            if ctx.json {
                output_json(&serde_json::json!({ "text": text }));
            } else {
                println!("{text}");
            }
        }
    }
    Ok(())
}

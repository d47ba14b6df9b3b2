//! `ot translate` -- show the template identifier of each name.

use anyhow::Result;
use ontask_template::translate;

use crate::cli::TranslateArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, output_pairs};

/// Execute the `ot translate` command.
pub fn run(ctx: &RuntimeContext, args: &TranslateArgs) -> Result<()> {
    let pairs: Vec<(String, String)> = args
        .names
        .iter()
        .map(|name| (name.clone(), translate(name)))
        .collect();

    if ctx.json {
        let map: serde_json::Map<String, serde_json::Value> = pairs
            .into_iter()
            .map(|(k, v)| (k, serde_json::Value::String(v)))
            .collect();
        output_json(&map);
    } else if pairs.len() == 1 {
        println!("{}", pairs[0].1);
    } else {
        output_pairs(&pairs);
    }
    Ok(())
}

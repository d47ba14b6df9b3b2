//! Output formatting helpers for the `ot` CLI.

use std::io::{self, Write};

use serde::Serialize;

/// Print `value` as pretty JSON on stdout.
pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            // Ignore broken pipe errors (e.g., piped to `head`)
            let _ = writeln!(handle, "{}", json);
        }
        Err(e) => {
            eprintln!("Error: failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print `(name, value)` pairs as an aligned two-column table.
pub fn output_pairs<K: AsRef<str>, V: std::fmt::Display>(pairs: &[(K, V)]) {
    let width = pairs.iter().map(|(k, _)| k.as_ref().len()).max().unwrap_or(0);
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for (k, v) in pairs {
        let _ = writeln!(handle, "{:<width$}  {}", k.as_ref(), v);
    }
}

//! Identifier translation for template variables.
//!
//! Every character outside `[A-Za-z0-9]` becomes a two-character `_x`
//! escape, names that do not start with an ASCII letter (or that already
//! start with the `OT_` prefix) get `OT_` prepended, and quoted literals are
//! left alone. Characters outside the escape table are spelled as
//! `_7<hex code point>_8`, so the mapping stays injective for any input.

use std::collections::HashMap;
use std::fmt::Write;

use crate::error::{RenderError, Result};

const PREFIX: &str = "OT_";

fn escape_char(ch: char) -> Option<&'static str> {
    Some(match ch {
        '!' => "_a",
        '"' => "_b",
        '#' => "_c",
        '$' => "_d",
        '%' => "_e",
        '&' => "_f",
        '\'' => "_g",
        '(' => "_h",
        ')' => "_i",
        '*' => "_j",
        '+' => "_k",
        ',' => "_l",
        '-' => "_m",
        '.' => "_n",
        '/' => "_o",
        ':' => "_p",
        ';' => "_q",
        '<' => "_r",
        '=' => "_s",
        '>' => "_t",
        '?' => "_u",
        '@' => "_v",
        '[' => "_w",
        '\\' => "_x",
        ']' => "_y",
        '^' => "_z",
        '_' => "_0",
        '`' => "_1",
        '{' => "_2",
        '|' => "_3",
        '}' => "_4",
        '~' => "_5",
        ' ' => "_6",
        _ => return None,
    })
}

fn is_quoted(name: &str) -> bool {
    name.len() >= 2
        && ((name.starts_with('\'') && name.ends_with('\''))
            || (name.starts_with('"') && name.ends_with('"')))
}

/// Maps `name` to an identifier accepted by the template engine.
///
/// ```
/// use ontask_template::translate;
///
/// assert_eq!(translate("first name"), "first_6name");
/// assert_eq!(translate("2nd"), "OT_02nd");
/// assert_eq!(translate("'literal'"), "'literal'");
/// ```
pub fn translate(name: &str) -> String {
    if is_quoted(name) {
        return name.to_owned();
    }

    let needs_prefix = !name.starts_with(|c: char| c.is_ascii_alphabetic())
        || name.starts_with(PREFIX);
    let source = if needs_prefix {
        format!("{PREFIX}{name}")
    } else {
        name.to_owned()
    };

    let mut out = String::with_capacity(source.len() + 8);
    for ch in source.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else if let Some(esc) = escape_char(ch) {
            out.push_str(esc);
        } else {
            let _ = write!(out, "_7{:x}_8", u32::from(ch));
        }
    }
    out
}

/// Translates every key of `context`, failing on a collision.
pub fn translate_context_keys<V: Clone>(
    context: &HashMap<String, V>,
) -> Result<HashMap<String, V>> {
    translate_keys_with(context, translate)
}

/// [`translate_context_keys`] with an arbitrary key mapping.
pub(crate) fn translate_keys_with<V: Clone>(
    context: &HashMap<String, V>,
    xlat: impl Fn(&str) -> String,
) -> Result<HashMap<String, V>> {
    let mut out: HashMap<String, V> = HashMap::with_capacity(context.len());
    let mut origin: HashMap<String, &str> = HashMap::with_capacity(context.len());
    for (key, value) in context {
        let translated = xlat(key);
        if let Some(first) = origin.get(&translated) {
            return Err(RenderError::Collision {
                first: (*first).to_owned(),
                second: key.clone(),
                translated,
            });
        }
        origin.insert(translated.clone(), key);
        out.insert(translated, value.clone());
    }
    Ok(out)
}

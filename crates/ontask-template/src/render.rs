//! Template execution.
//!
//! Rendering runs in four steps:
//!
//! 1. rewrite variable references in the text with [`translate`];
//! 2. translate the context keys the same way (HTML-escaping them first when
//!    the text comes from an HTML editor, which stores `&` as `&amp;`);
//! 3. bind the action under [`ACTION_CONTEXT_VAR`], if one is given;
//! 4. execute the result with minijinja.

use std::collections::{BTreeMap, HashMap};

use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use ontask_core::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RenderError, Result};
use crate::scan::rewrite_references;
use crate::translate::{translate, translate_keys_with};

/// Context name bound to the action being rendered.
pub const ACTION_CONTEXT_VAR: &str = "ONTASK_ACTION_CONTEXT_VARIABLE___";

/// Context name holding the visualization counter, starting at 0.
pub const VIZ_NUMBER_CONTEXT_VAR: &str = "ONTASK_VIZ_NUMBER_CONTEXT_VARIABLE___";

/// Knobs for [`render_template`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Auto-escape output and HTML-escape context keys.
    pub html: bool,
    /// Referencing an unknown variable is an error instead of rendering empty.
    pub strict_undefined: bool,
    pub keep_trailing_newline: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            html: true,
            strict_undefined: false,
            keep_trailing_newline: true,
        }
    }
}

impl RenderOptions {
    /// Plain-text rendering: no escaping of any kind.
    pub fn plain() -> Self {
        Self {
            html: false,
            ..Self::default()
        }
    }

    fn environment(&self) -> Environment<'static> {
        let mut env = Environment::new();
        if self.strict_undefined {
            env.set_undefined_behavior(UndefinedBehavior::Strict);
        }
        let escape = if self.html {
            AutoEscape::Html
        } else {
            AutoEscape::None
        };
        env.set_auto_escape_callback(move |_| escape.clone());
        env.set_keep_trailing_newline(self.keep_trailing_newline);
        // Null cells render empty, not as "none".
        env.set_formatter(|out, state, value| {
            if value.is_none() {
                Ok(())
            } else {
                minijinja::escape_formatter(out, state, value)
            }
        });
        env
    }
}

/// Translates a referenced name. The injected bindings (and attribute paths
/// into them) are referenced verbatim.
fn translate_reference(name: &str) -> String {
    let reserved = [ACTION_CONTEXT_VAR, VIZ_NUMBER_CONTEXT_VAR].iter().any(|r| {
        name.strip_prefix(r)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
    });
    if reserved {
        name.to_owned()
    } else {
        translate(name)
    }
}

/// The escaping an HTML editor applies to text it stores.
fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Renders `text` against `context`.
pub fn render_template(text: &str, context: &Context, options: &RenderOptions) -> Result<String> {
    render_with(text, context, None, options)
}

/// Renders `text` against `context` with `action` bound under
/// [`ACTION_CONTEXT_VAR`] and the visualization counter under
/// [`VIZ_NUMBER_CONTEXT_VAR`].
pub fn render_action_template<A: Serialize>(
    text: &str,
    context: &Context,
    action: &A,
    options: &RenderOptions,
) -> Result<String> {
    render_with(
        text,
        context,
        Some(minijinja::Value::from_serialize(action)),
        options,
    )
}

fn render_with(
    text: &str,
    context: &Context,
    action: Option<minijinja::Value>,
    options: &RenderOptions,
) -> Result<String> {
    if action.is_some() {
        for reserved in [ACTION_CONTEXT_VAR, VIZ_NUMBER_CONTEXT_VAR] {
            if context.contains_key(reserved) {
                return Err(RenderError::ReservedName(reserved.to_owned()));
            }
        }
    }

    let html = options.html;
    let keys = translate_keys_with(context, |key| {
        if html {
            translate(&html_escape(key))
        } else {
            translate(key)
        }
    })?;
    render_translated(text, keys, action, options)
}

fn render_translated(
    text: &str,
    keys: HashMap<String, ontask_core::Value>,
    action: Option<minijinja::Value>,
    options: &RenderOptions,
) -> Result<String> {
    let source = rewrite_references(text, translate_reference);

    let mut bindings: BTreeMap<String, minijinja::Value> = keys
        .into_iter()
        .map(|(k, v)| (k, minijinja::Value::from_serialize(&v)))
        .collect();

    if let Some(action) = action {
        bindings.insert(ACTION_CONTEXT_VAR.to_owned(), action);
        bindings.insert(VIZ_NUMBER_CONTEXT_VAR.to_owned(), minijinja::Value::from(0));
    }

    debug!(variables = bindings.len(), "rendering template");
    let env = options.environment();
    Ok(env.render_str(&source, &bindings)?)
}

/// HTML fragment shown in place of a preview whose template does not parse.
pub fn render_syntax_error(message: &str) -> String {
    format!(
        "<div class=\"alert alert-danger\" role=\"alert\">\n  \
         <p>Syntax error detected in the template:</p>\n  \
         <pre>{}</pre>\n</div>\n",
        html_escape(message)
    )
}

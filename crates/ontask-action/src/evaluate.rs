//! Bulk evaluation of an action over the rows of its workflow table.

use ontask_core::{Context, Value};
use ontask_formula::evaluate_bool;
use ontask_storage::TabularStore;
use ontask_template::{render_action_template, render_template, RenderError, RenderOptions};
use serde::ser::{Serialize, SerializeSeq, Serializer};
use tracing::{debug, info};

use crate::error::{ActionError, Result};
use crate::model::{Action, Workflow};

/// Knobs for [`evaluate_action`].
#[derive(Debug, Clone, Default)]
pub struct EvaluateOptions {
    /// Second template rendered per row (typically an email subject).
    pub extra_text: Option<String>,
    /// Column whose value is appended to every record; also the column
    /// checked against `exclude_values`.
    pub key_column: Option<String>,
    /// Rows whose key value is listed here are skipped. Doubles are written
    /// with a decimal point (`18.0`), other values in their display form.
    pub exclude_values: Vec<String>,
    pub render: RenderOptions,
}

/// One rendered row: body, then the optional subject and key value.
///
/// Serializes as a sequence of one to three elements.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRecord {
    pub body: String,
    pub subject: Option<String>,
    pub key: Option<Value>,
}

impl Serialize for RenderedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = 1 + usize::from(self.subject.is_some()) + usize::from(self.key.is_some());
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.body)?;
        if let Some(subject) = &self.subject {
            seq.serialize_element(subject)?;
        }
        if let Some(key) = &self.key {
            seq.serialize_element(key)?;
        }
        seq.end()
    }
}

/// Evaluates the non-filter conditions of `action` against `row` and
/// returns the rendering context.
///
/// Later sources win: row values, then condition flags, then workflow
/// attributes.
pub fn build_row_context(workflow: &Workflow, action: &Action, row: Context) -> Result<Context> {
    let mut flags = Vec::new();
    for condition in action.named_conditions() {
        let value = evaluate_bool(&condition.formula, Some(&row))
            .map_err(|e| ActionError::formula(&condition.name, e))?;
        flags.push((condition.name.clone(), Value::Bool(value)));
    }

    let mut context = row;
    context.extend(flags);
    context.extend(
        workflow
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );
    Ok(context)
}

/// Maps a body rendering failure. Template problems become
/// [`ActionError::TextSyntax`]; context problems keep their own variant.
pub(crate) fn body_error(err: RenderError) -> ActionError {
    match err {
        RenderError::Syntax(msg) | RenderError::Execution(msg) => ActionError::TextSyntax(msg),
        other => ActionError::Render(other),
    }
}

fn subject_error(err: RenderError) -> ActionError {
    match err {
        RenderError::Syntax(msg) | RenderError::Execution(msg) => ActionError::SubjectSyntax(msg),
        other => ActionError::Render(other),
    }
}

/// Text a key value is matched against in `exclude_values`. Doubles keep
/// their decimal point (`18.0`); everything else uses its display form.
fn exclusion_key(value: &Value) -> String {
    match value {
        Value::Double(d) => format!("{d:?}"),
        other => other.to_string(),
    }
}

/// Renders `action` for every row selected by its filter.
///
/// Rows are processed in store order. The first rendering failure aborts
/// the whole run; no partial result is returned.
pub fn evaluate_action(
    workflow: &Workflow,
    action: &Action,
    store: &dyn TabularStore,
    options: &EvaluateOptions,
) -> Result<Vec<RenderedRecord>> {
    let columns = workflow.column_names();
    let rows = store.get_rows(workflow.id, action.filter_formula(), &columns)?;

    let key_column = options
        .key_column
        .as_deref()
        .filter(|k| columns.iter().any(|c| c == k));

    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;
    for row in rows {
        let row = row.into_context(&columns);

        let key = key_column.and_then(|k| row.get(k).cloned());
        if let Some(key) = &key {
            let shown = exclusion_key(key);
            if options.exclude_values.iter().any(|v| *v == shown) {
                skipped += 1;
                continue;
            }
        }

        let context = build_row_context(workflow, action, row)?;

        let body = render_action_template(&action.content, &context, action, &options.render)
            .map_err(body_error)?;
        let subject = options
            .extra_text
            .as_deref()
            .map(|text| render_template(text, &context, &options.render))
            .transpose()
            .map_err(subject_error)?;

        records.push(RenderedRecord { body, subject, key });
    }

    info!(
        action = %action.name,
        rows = records.len(),
        skipped,
        "evaluated action"
    );
    Ok(records)
}

/// Renders `action` for a single, already-built context.
///
/// `text`, when given, is rendered in place of the action content, still
/// with the action bound. Returns `Ok(None)` when there is no row. Template
/// syntax problems are reported inline as an HTML fragment rather than as an
/// error, so a preview always has something to show.
pub fn evaluate_row_action_out(
    action: &Action,
    context: Option<&Context>,
    text: Option<&str>,
    options: &RenderOptions,
) -> Result<Option<String>> {
    let Some(context) = context else {
        return Ok(None);
    };
    if action.is_in() {
        return Err(ActionError::IncorrectActionType(format!(
            "{} is an input action",
            action.name
        )));
    }

    let text = text.unwrap_or(&action.content);
    match render_action_template(text, context, action, options) {
        Ok(rendered) => Ok(Some(rendered)),
        Err(RenderError::Syntax(msg)) => {
            debug!(action = %action.name, error = %msg, "preview has a syntax error");
            Ok(Some(ontask_template::render_syntax_error(&msg)))
        }
        Err(err) => Err(body_error(err)),
    }
}

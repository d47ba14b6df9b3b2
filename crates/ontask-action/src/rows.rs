//! Single-row access: row lookup for previews, input-action values and
//! per-condition row counts.

use ontask_core::{Context, Value};
use ontask_formula::Formula;
use ontask_storage::TabularStore;
use tracing::debug;

use crate::error::{ActionError, Result};
use crate::model::{Action, Workflow};

/// How to pick one row of the filtered table.
#[derive(Debug, Clone, PartialEq)]
pub enum RowSelector {
    /// Position among the rows selected by the filter, counting from 1.
    Index(usize),
    /// First selected row whose `column` equals `value`.
    Key { column: String, value: Value },
}

/// Values of the row picked by `selector`, keyed by column name.
///
/// The action's filter applies; `None` when no selected row matches.
pub fn get_row_values(
    workflow: &Workflow,
    action: &Action,
    store: &dyn TabularStore,
    selector: &RowSelector,
) -> Result<Option<Context>> {
    let columns = workflow.column_names();
    let filter = action.filter_formula();
    let row = match selector {
        RowSelector::Index(index) => {
            store.get_row_by_index(workflow.id, filter, *index, &columns)?
        }
        RowSelector::Key { column, value } => {
            store.get_row_by_key(workflow.id, filter, column, value, &columns)?
        }
    };
    Ok(row.map(|r| r.into_context(&columns)))
}

/// Active input columns of `action` paired with their current values.
pub fn evaluate_row_action_in(action: &Action, context: &Context) -> Result<Vec<(String, Value)>> {
    if !action.is_in() {
        return Err(ActionError::IncorrectActionType(format!(
            "{} is not an input action",
            action.name
        )));
    }
    action
        .active_columns()
        .map(|column| {
            context
                .get(&column.name)
                .map(|v| (column.name.clone(), v.clone()))
                .ok_or_else(|| ActionError::MissingColumn(column.name.clone()))
        })
        .collect()
}

/// Refreshes `n_rows_selected` on every condition of `action`.
///
/// A filter counts its own rows; other conditions count the rows matching
/// both the filter and the condition.
pub fn update_n_rows_selected(
    action: &mut Action,
    store: &dyn TabularStore,
    workflow_id: i64,
) -> Result<()> {
    let filter = action.filter_formula().cloned();
    for condition in &mut action.conditions {
        let count = if condition.is_filter {
            store.count_rows(workflow_id, Some(&condition.formula))?
        } else {
            let formula = match &filter {
                Some(f) => Formula::and(vec![f.clone(), condition.formula.clone()]),
                None => condition.formula.clone(),
            };
            store.count_rows(workflow_id, Some(&formula))?
        };
        debug!(condition = %condition.name, rows = count, "counted selected rows");
        condition.n_rows_selected = Some(count);
    }
    Ok(())
}

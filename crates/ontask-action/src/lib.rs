//! Workflow model and row evaluation pipeline for OnTask actions.
//!
//! [`evaluate_action`] fetches the rows selected by an action's filter,
//! evaluates its conditions per row, merges row values, condition flags and
//! workflow attributes into one context and renders the action text (and an
//! optional subject) for each row. The single-row helpers in [`rows`] and
//! [`evaluate_row_action_out`] back previews.

pub mod error;
pub mod evaluate;
pub mod model;
pub mod rows;

#[cfg(test)]
mod testutil;

pub use error::{ActionError, Result};
pub use evaluate::{
    build_row_context, evaluate_action, evaluate_row_action_out, EvaluateOptions, RenderedRecord,
};
pub use model::{Action, ActionColumn, ActionType, Condition, Workflow};
pub use rows::{evaluate_row_action_in, get_row_values, update_n_rows_selected, RowSelector};

//! The [`TabularStore`] trait: read access to a workflow's data table.
//!
//! The row evaluation pipeline depends on this trait rather than on
//! [`SqliteStore`](crate::SqliteStore) so other backends can be plugged in.

use ontask_core::{Row, Value};
use ontask_formula::Formula;

use crate::error::Result;

/// Row source for a workflow, optionally narrowed by a filter formula.
///
/// Rows come back in store order with cells in the order of `columns`.
pub trait TabularStore {
    /// All rows matching `filter` (all rows when `None`).
    fn get_rows(
        &self,
        workflow_id: i64,
        filter: Option<&Formula>,
        columns: &[String],
    ) -> Result<Vec<Row>>;

    /// The `index`-th matching row, counting from 1.
    fn get_row_by_index(
        &self,
        workflow_id: i64,
        filter: Option<&Formula>,
        index: usize,
        columns: &[String],
    ) -> Result<Option<Row>>;

    /// The first matching row whose `key_column` equals `key_value`.
    fn get_row_by_key(
        &self,
        workflow_id: i64,
        filter: Option<&Formula>,
        key_column: &str,
        key_value: &Value,
        columns: &[String],
    ) -> Result<Option<Row>>;

    /// Number of rows matching `filter`.
    fn count_rows(&self, workflow_id: i64, filter: Option<&Formula>) -> Result<usize>;

    /// Column names of the workflow table, in table order.
    fn column_names(&self, workflow_id: i64) -> Result<Vec<String>>;
}

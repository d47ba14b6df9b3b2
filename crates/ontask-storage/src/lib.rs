//! Tabular data storage for OnTask workflows.
//!
//! Provides the [`TabularStore`] trait and a SQLite implementation
//! ([`SqliteStore`]) whose row filters are compiled from formulas.

pub mod error;
pub mod sqlite;
pub mod traits;

// Re-exports for convenience.
pub use error::{Result, StorageError};
pub use sqlite::{table_name, SqliteStore};
pub use traits::TabularStore;

// ---------------------------------------------------------------------------
// TabularStore trait implementation for SqliteStore
// ---------------------------------------------------------------------------

use ontask_core::{Row, Value};
use ontask_formula::Formula;

impl TabularStore for SqliteStore {
    fn get_rows(
        &self,
        workflow_id: i64,
        filter: Option<&Formula>,
        columns: &[String],
    ) -> Result<Vec<Row>> {
        self.get_rows_impl(workflow_id, filter, columns)
    }

    fn get_row_by_index(
        &self,
        workflow_id: i64,
        filter: Option<&Formula>,
        index: usize,
        columns: &[String],
    ) -> Result<Option<Row>> {
        self.get_row_by_index_impl(workflow_id, filter, index, columns)
    }

    fn get_row_by_key(
        &self,
        workflow_id: i64,
        filter: Option<&Formula>,
        key_column: &str,
        key_value: &Value,
        columns: &[String],
    ) -> Result<Option<Row>> {
        self.get_row_by_key_impl(workflow_id, filter, key_column, key_value, columns)
    }

    fn count_rows(&self, workflow_id: i64, filter: Option<&Formula>) -> Result<usize> {
        self.count_rows_impl(workflow_id, filter)
    }

    fn column_names(&self, workflow_id: i64) -> Result<Vec<String>> {
        self.column_names_impl(workflow_id)
    }
}

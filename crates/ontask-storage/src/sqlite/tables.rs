//! Workflow table management for [`SqliteStore`].

use std::collections::HashMap;

use rusqlite::Connection;
use tracing::{debug, info};

use ontask_core::{Column, Row, Value};

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;
use crate::sqlite::values::{sql_type, SqlValue};

/// Name of the table holding the data of `workflow_id`.
pub fn table_name(workflow_id: i64) -> String {
    format!("ontask_workflow_{workflow_id}")
}

/// Double-quoted SQLite identifier.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

// ---------------------------------------------------------------------------
// Connection-level helpers (shared with queries)
// ---------------------------------------------------------------------------

pub(crate) fn table_exists_on_conn(conn: &Connection, workflow_id: i64) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        rusqlite::params![table_name(workflow_id)],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Column names in table order; `NotFound` when the table does not exist.
pub(crate) fn column_names_on_conn(conn: &Connection, workflow_id: i64) -> Result<Vec<String>> {
    if !table_exists_on_conn(conn, workflow_id)? {
        return Err(StorageError::not_found("table", table_name(workflow_id)));
    }
    let mut stmt = conn.prepare(&format!(
        "SELECT name FROM pragma_table_info('{}') ORDER BY cid",
        table_name(workflow_id)
    ))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

/// Returns a `NotFound` error for the first of `wanted` not in `known`.
pub(crate) fn check_columns(known: &[String], wanted: &[String]) -> Result<()> {
    match wanted.iter().find(|w| !known.contains(w)) {
        Some(missing) => Err(StorageError::not_found("column", missing.as_str())),
        None => Ok(()),
    }
}

fn insert_rows_on_conn(conn: &Connection, workflow_id: i64, rows: &[Row]) -> Result<usize> {
    let columns = column_names_on_conn(conn, workflow_id)?;
    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({placeholders})",
        quote_ident(&table_name(workflow_id)),
        columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", "),
    );

    let mut stmt = conn.prepare(&sql)?;
    for (i, row) in rows.iter().enumerate() {
        if row.len() != columns.len() {
            return Err(StorageError::validation(format!(
                "row {} has {} values, table has {} columns",
                i + 1,
                row.len(),
                columns.len()
            )));
        }
        let params: Vec<SqlValue<'_>> = row.values().iter().map(SqlValue).collect();
        stmt.execute(rusqlite::params_from_iter(params))?;
    }
    Ok(rows.len())
}

// ---------------------------------------------------------------------------
// SqliteStore methods
// ---------------------------------------------------------------------------

impl SqliteStore {
    /// Creates the data table of `workflow_id` with the given columns.
    pub fn create_table(&self, workflow_id: i64, columns: &[Column]) -> Result<()> {
        if columns.is_empty() {
            return Err(StorageError::validation("a table needs at least one column"));
        }
        let conn = self.lock_conn()?;
        if table_exists_on_conn(&conn, workflow_id)? {
            return Err(StorageError::validation(format!(
                "table {} already exists",
                table_name(workflow_id)
            )));
        }

        let defs = columns
            .iter()
            .map(|c| {
                let unique = if c.is_key { " UNIQUE" } else { "" };
                format!("{} {}{unique}", quote_ident(&c.name), sql_type(c.data_type))
            })
            .collect::<Vec<_>>()
            .join(", ");
        conn.execute_batch(&format!(
            "CREATE TABLE {} ({defs})",
            quote_ident(&table_name(workflow_id))
        ))?;

        info!(workflow_id, columns = columns.len(), "created workflow table");
        Ok(())
    }

    /// Drops the data table of `workflow_id` if it exists.
    pub fn drop_table(&self, workflow_id: i64) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS {}",
            quote_ident(&table_name(workflow_id))
        ))?;
        debug!(workflow_id, "dropped workflow table");
        Ok(())
    }

    /// Appends `rows` (cells in table column order) in one transaction.
    pub fn insert_rows(&self, workflow_id: i64, rows: &[Row]) -> Result<usize> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        let inserted = insert_rows_on_conn(&tx, workflow_id, rows)?;
        tx.commit()?;
        debug!(workflow_id, rows = inserted, "inserted rows");
        Ok(inserted)
    }

    /// Renames a column of the workflow table.
    pub fn rename_column(&self, workflow_id: i64, old: &str, new: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        let columns = column_names_on_conn(&conn, workflow_id)?;
        check_columns(&columns, &[old.to_owned()])?;
        if columns.iter().any(|c| c == new) {
            return Err(StorageError::validation(format!("column {new} already exists")));
        }
        conn.execute_batch(&format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            quote_ident(&table_name(workflow_id)),
            quote_ident(old),
            quote_ident(new)
        ))?;
        info!(workflow_id, old, new, "renamed column");
        Ok(())
    }

    /// Loads rows from a JSON array of objects keyed by column name.
    ///
    /// The table is created from `columns` when it does not exist. Missing
    /// keys become nulls; values are coerced to the declared column type.
    pub fn import_json_rows(&self, workflow_id: i64, columns: &[Column], json: &str) -> Result<usize> {
        let records: Vec<HashMap<String, Value>> = serde_json::from_str(json)?;

        let mut rows = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            let mut cells = Vec::with_capacity(columns.len());
            for column in columns {
                let raw = record.get(&column.name).cloned().unwrap_or_default();
                let cell = if raw.is_null() {
                    Value::Null
                } else {
                    column.data_type.coerce(&raw).ok_or_else(|| {
                        StorageError::validation(format!(
                            "record {}: {:?} is not a valid {} for column {}",
                            i + 1,
                            raw.to_string(),
                            column.data_type,
                            column.name
                        ))
                    })?
                };
                cells.push(cell);
            }
            rows.push(Row::new(cells));
        }

        let exists = {
            let conn = self.lock_conn()?;
            table_exists_on_conn(&conn, workflow_id)?
        };
        if !exists {
            self.create_table(workflow_id, columns)?;
        }
        self.insert_rows(workflow_id, &rows)
    }
}

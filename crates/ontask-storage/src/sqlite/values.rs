//! Conversions between [`Value`] and SQLite storage classes.
//!
//! Booleans are stored as `0`/`1` in `BOOLEAN` columns and datetimes as
//! RFC 3339 text in `DATETIME` columns; the declared column type tells the
//! reader how to turn them back.

use ontask_core::value::{format_datetime, parse_datetime};
use ontask_core::{Value, ValueType};
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};

/// Declared SQL type for a column of `value_type`.
pub(crate) fn sql_type(value_type: ValueType) -> &'static str {
    match value_type {
        ValueType::Integer => "INTEGER",
        ValueType::Double => "REAL",
        ValueType::Boolean => "BOOLEAN",
        ValueType::String => "TEXT",
        ValueType::Datetime => "DATETIME",
    }
}

/// Borrowing [`ToSql`] adapter for [`Value`].
pub(crate) struct SqlValue<'a>(pub &'a Value);

impl ToSql for SqlValue<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Bool(b) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(i64::from(*b))),
            Value::Integer(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            Value::Double(d) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*d)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::DateTime(dt) => {
                ToSqlOutput::Owned(rusqlite::types::Value::Text(format_datetime(dt)))
            }
        })
    }
}

/// Reads a cell, using the declared column type to restore booleans and
/// datetimes.
pub(crate) fn read_value(cell: ValueRef<'_>, decl_type: Option<&str>) -> Value {
    let decl = decl_type.map(str::to_ascii_uppercase);
    match (cell, decl.as_deref()) {
        (ValueRef::Null, _) => Value::Null,
        (ValueRef::Integer(i), Some("BOOLEAN")) => Value::Bool(i != 0),
        (ValueRef::Integer(i), _) => Value::Integer(i),
        (ValueRef::Real(d), _) => Value::Double(d),
        (ValueRef::Text(bytes), decl) => {
            let text = String::from_utf8_lossy(bytes).into_owned();
            match decl {
                Some("DATETIME") => parse_datetime(&text).map_or(Value::Text(text), Value::DateTime),
                _ => Value::Text(text),
            }
        }
        (ValueRef::Blob(bytes), _) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
    }
}

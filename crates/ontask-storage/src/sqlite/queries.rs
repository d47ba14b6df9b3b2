//! Filtered row reads for [`SqliteStore`].
//!
//! Filters are compiled with the SQL backend of the formula engine and bound
//! as parameters; rows come back in insertion (`rowid`) order.

use rusqlite::Connection;
use tracing::debug;

use ontask_core::{Row, Value};
use ontask_formula::{to_sql_checked, Formula, PlaceholderStyle, SqlPredicate};

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;
use crate::sqlite::tables::{check_columns, column_names_on_conn, quote_ident, table_name};
use crate::sqlite::values::{read_value, SqlValue};

/// Compiles `filter` against the table's columns; `None` selects everything.
fn compile_filter(filter: Option<&Formula>, known: &[String]) -> Result<SqlPredicate> {
    match filter {
        Some(f) => Ok(to_sql_checked(f, PlaceholderStyle::Question, known)?),
        None => Ok(SqlPredicate::default()),
    }
}

fn where_clause(predicate: &SqlPredicate) -> String {
    if predicate.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", predicate.sql)
    }
}

/// Runs `SELECT columns ... WHERE predicate ORDER BY rowid <suffix>`.
fn select_rows_on_conn(
    conn: &Connection,
    workflow_id: i64,
    predicate: &SqlPredicate,
    columns: &[String],
    suffix: &str,
) -> Result<Vec<Row>> {
    if columns.is_empty() {
        return Err(StorageError::validation("no columns selected"));
    }
    let sql = format!(
        "SELECT {} FROM {}{} ORDER BY rowid{suffix}",
        columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", "),
        quote_ident(&table_name(workflow_id)),
        where_clause(predicate),
    );
    debug!(workflow_id, %sql, params = predicate.params.len(), "selecting rows");

    let mut stmt = conn.prepare(&sql)?;
    let decl_types: Vec<Option<String>> = stmt
        .columns()
        .iter()
        .map(|c| c.decl_type().map(str::to_owned))
        .collect();

    let params: Vec<SqlValue<'_>> = predicate.params.iter().map(SqlValue).collect();
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params), |row| {
            let cells = decl_types
                .iter()
                .enumerate()
                .map(|(i, decl)| Ok(read_value(row.get_ref(i)?, decl.as_deref())))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(Row::new(cells))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

impl SqliteStore {
    pub(crate) fn get_rows_impl(
        &self,
        workflow_id: i64,
        filter: Option<&Formula>,
        columns: &[String],
    ) -> Result<Vec<Row>> {
        let conn = self.lock_conn()?;
        let known = column_names_on_conn(&conn, workflow_id)?;
        check_columns(&known, columns)?;
        let predicate = compile_filter(filter, &known)?;
        select_rows_on_conn(&conn, workflow_id, &predicate, columns, "")
    }

    pub(crate) fn get_row_by_index_impl(
        &self,
        workflow_id: i64,
        filter: Option<&Formula>,
        index: usize,
        columns: &[String],
    ) -> Result<Option<Row>> {
        if index == 0 {
            return Err(StorageError::validation("row indices start at 1"));
        }
        let conn = self.lock_conn()?;
        let known = column_names_on_conn(&conn, workflow_id)?;
        check_columns(&known, columns)?;
        let predicate = compile_filter(filter, &known)?;
        let suffix = format!(" LIMIT 1 OFFSET {}", index - 1);
        Ok(select_rows_on_conn(&conn, workflow_id, &predicate, columns, &suffix)?
            .into_iter()
            .next())
    }

    pub(crate) fn get_row_by_key_impl(
        &self,
        workflow_id: i64,
        filter: Option<&Formula>,
        key_column: &str,
        key_value: &Value,
        columns: &[String],
    ) -> Result<Option<Row>> {
        let conn = self.lock_conn()?;
        let known = column_names_on_conn(&conn, workflow_id)?;
        check_columns(&known, columns)?;
        check_columns(&known, &[key_column.to_owned()])?;

        let key = SqlPredicate::new(format!("{} = ?", quote_ident(key_column)), vec![key_value.clone()]);
        let predicate = SqlPredicate::conjoin([compile_filter(filter, &known)?, key]);
        Ok(select_rows_on_conn(&conn, workflow_id, &predicate, columns, " LIMIT 1")?
            .into_iter()
            .next())
    }

    pub(crate) fn count_rows_impl(&self, workflow_id: i64, filter: Option<&Formula>) -> Result<usize> {
        let conn = self.lock_conn()?;
        let known = column_names_on_conn(&conn, workflow_id)?;
        let predicate = compile_filter(filter, &known)?;
        let sql = format!(
            "SELECT COUNT(*) FROM {}{}",
            quote_ident(&table_name(workflow_id)),
            where_clause(&predicate)
        );
        let params: Vec<SqlValue<'_>> = predicate.params.iter().map(SqlValue).collect();
        let count: i64 = conn.query_row(&sql, rusqlite::params_from_iter(params), |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    pub(crate) fn column_names_impl(&self, workflow_id: i64) -> Result<Vec<String>> {
        let conn = self.lock_conn()?;
        column_names_on_conn(&conn, workflow_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::TabularStore;
    use chrono::{TimeZone, Utc};
    use ontask_core::{Column, Context, ValueType};
    use ontask_formula::{evaluate_bool, Operand, Operator};
    use pretty_assertions::assert_eq;

    fn store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .create_table(
                1,
                &[
                    Column::new("email", ValueType::String).key(),
                    Column::new("age", ValueType::Integer),
                    Column::new("score", ValueType::Double),
                ],
            )
            .unwrap();
        store
            .insert_rows(
                1,
                &[
                    Row::new(vec![Value::from("ada@x.org"), Value::Integer(36), Value::Double(8.5)]),
                    Row::new(vec![Value::from("bob@y.com"), Value::Integer(17), Value::Null]),
                    Row::new(vec![Value::from("cy@x.org"), Value::Null, Value::Double(4.0)]),
                ],
            )
            .unwrap();
        store
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn adults() -> Formula {
        Formula::leaf("age", Operator::GreaterOrEqual, ValueType::Integer, Value::from("18"))
    }

    #[test]
    fn rows_in_insertion_order() {
        let rows = store().get_rows(1, None, &cols(&["email"])).unwrap();
        let emails: Vec<String> = rows.iter().map(|r| r.values()[0].to_string()).collect();
        assert_eq!(emails, vec!["ada@x.org", "bob@y.com", "cy@x.org"]);
    }

    #[test]
    fn filtered_rows() {
        let rows = store().get_rows(1, Some(&adults()), &cols(&["email", "age"])).unwrap();
        assert_eq!(
            rows,
            vec![Row::new(vec![Value::from("ada@x.org"), Value::Integer(36)])]
        );
    }

    #[test]
    fn row_by_index_is_one_based_and_filtered() {
        let s = store();
        let email = cols(&["email"]);
        assert_eq!(
            s.get_row_by_index(1, None, 2, &email).unwrap(),
            Some(Row::new(vec![Value::from("bob@y.com")]))
        );
        assert_eq!(s.get_row_by_index(1, None, 4, &email).unwrap(), None);
        assert_eq!(
            s.get_row_by_index(1, Some(&adults()), 1, &email).unwrap(),
            Some(Row::new(vec![Value::from("ada@x.org")]))
        );
        assert!(s.get_row_by_index(1, None, 0, &email).is_err());
    }

    #[test]
    fn row_by_key() {
        let s = store();
        let row = s
            .get_row_by_key(1, None, "email", &Value::from("cy@x.org"), &cols(&["score"]))
            .unwrap();
        assert_eq!(row, Some(Row::new(vec![Value::Double(4.0)])));

        // The filter still applies.
        let row = s
            .get_row_by_key(1, Some(&adults()), "email", &Value::from("cy@x.org"), &cols(&["score"]))
            .unwrap();
        assert_eq!(row, None);
    }

    #[test]
    fn count_rows() {
        let s = store();
        assert_eq!(s.count_rows(1, None).unwrap(), 3);
        assert_eq!(s.count_rows(1, Some(&adults())).unwrap(), 1);
        let no_score = Formula::leaf("score", Operator::IsNull, ValueType::Double, Operand::None);
        assert_eq!(s.count_rows(1, Some(&no_score)).unwrap(), 1);
    }

    #[test]
    fn unknown_columns_are_reported() {
        let s = store();
        assert!(s.get_rows(1, None, &cols(&["nope"])).unwrap_err().is_not_found());
        let bad = Formula::leaf("nope", Operator::IsNull, ValueType::String, Operand::None);
        assert!(matches!(
            s.count_rows(1, Some(&bad)),
            Err(StorageError::Formula(_))
        ));
    }

    /// A non-null cell is selected by the SQL predicate exactly when the
    /// boolean evaluation of the same formula is true. Negated operators
    /// deliberately differ on nulls (SQL selects them, boolean mode does not).
    #[test]
    fn sql_and_boolean_modes_agree() {
        let when = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let cases: Vec<(Column, Value, Formula)> = vec![
            (
                Column::new("name", ValueType::String),
                Value::from("Ada Lovelace"),
                Formula::leaf("name", Operator::BeginsWith, ValueType::String, Value::from("Ada")),
            ),
            (
                Column::new("name", ValueType::String),
                Value::from("Ada Lovelace"),
                Formula::leaf("name", Operator::Contains, ValueType::String, Value::from("love")),
            ),
            (
                Column::new("name", ValueType::String),
                Value::from("50% off"),
                Formula::leaf("name", Operator::Contains, ValueType::String, Value::from("0%")),
            ),
            (
                Column::new("name", ValueType::String),
                Value::from("abc"),
                Formula::leaf("name", Operator::NotEndsWith, ValueType::String, Value::from("x")),
            ),
            (
                Column::new("name", ValueType::String),
                Value::from(""),
                Formula::leaf("name", Operator::IsEmpty, ValueType::String, Operand::None),
            ),
            (
                Column::new("n", ValueType::Integer),
                Value::Integer(10),
                Formula::leaf("n", Operator::Between, ValueType::Integer, (Value::Integer(10), Value::Integer(20))),
            ),
            (
                Column::new("n", ValueType::Integer),
                Value::Integer(21),
                Formula::leaf("n", Operator::NotBetween, ValueType::Integer, (Value::Integer(10), Value::Integer(20))),
            ),
            (
                Column::new("n", ValueType::Integer),
                Value::Integer(4),
                Formula::leaf("n", Operator::NotEqual, ValueType::Integer, Value::Integer(3)),
            ),
            (
                Column::new("x", ValueType::Double),
                Value::Double(2.5),
                Formula::leaf("x", Operator::Less, ValueType::Double, Value::from("3")),
            ),
            (
                Column::new("ok", ValueType::Boolean),
                Value::Bool(false),
                Formula::leaf("ok", Operator::Equal, ValueType::Boolean, Value::from("false")),
            ),
            (
                Column::new("due", ValueType::Datetime),
                Value::DateTime(when),
                Formula::leaf("due", Operator::Greater, ValueType::Datetime, Value::from("2024-02-28")),
            ),
            (
                Column::new("due", ValueType::Datetime),
                Value::DateTime(when),
                Formula::and(vec![
                    Formula::leaf("due", Operator::IsNotNull, ValueType::Datetime, Operand::None),
                    Formula::leaf("due", Operator::Less, ValueType::Datetime, Value::from("2024-03-01T08:00:00Z")),
                ])
                .negated(),
            ),
        ];

        for (i, (column, value, formula)) in cases.into_iter().enumerate() {
            let store = SqliteStore::open_in_memory().unwrap();
            let name = column.name.clone();
            store.create_table(1, &[column]).unwrap();
            store.insert_rows(1, &[Row::new(vec![value.clone()])]).unwrap();

            let ctx: Context = [(name, value)].into();
            let expected = evaluate_bool(&formula, Some(&ctx)).unwrap();
            let selected = store.count_rows(1, Some(&formula)).unwrap() == 1;
            assert_eq!(selected, expected, "case {i}: {formula:?}");
        }
    }

    /// Same agreement over a nested, negated tree and several rows: the
    /// rows the predicate selects are exactly those boolean mode accepts.
    #[test]
    fn sql_and_boolean_modes_agree_on_nested_trees() {
        let columns = [
            Column::new("age", ValueType::Integer),
            Column::new("first name", ValueType::String),
            Column::new("score", ValueType::Double),
            Column::new("city", ValueType::String),
            Column::new("email", ValueType::String),
        ];
        let formula = Formula::and(vec![
            Formula::or(vec![
                Formula::leaf("age", Operator::Greater, ValueType::Integer, Value::Integer(18)),
                Formula::leaf("first name", Operator::BeginsWith, ValueType::String, Value::from("A")),
            ])
            .negated(),
            Formula::leaf(
                "score",
                Operator::Between,
                ValueType::Double,
                (Value::Double(1.0), Value::Double(9.5)),
            ),
            Formula::or(vec![
                Formula::leaf("city", Operator::IsNull, ValueType::String, Operand::None),
                Formula::and(vec![
                    Formula::leaf("email", Operator::Contains, ValueType::String, Value::from("@")),
                    Formula::leaf("age", Operator::Less, ValueType::Integer, Value::Integer(65)),
                ]),
            ]),
        ]);

        let people = [
            (30, "Ada", 5.0, "Oslo", "ada@x.org"),
            (12, "Bob", 5.0, "Rome", "bob@x.org"),
            (15, "Cy", 9.9, "Lima", "cy@x.org"),
            (10, "Dee", 2.0, "Kyiv", "dee.example"),
            (17, "Eve", 1.0, "Pune", "eve@x.org"),
        ];
        let rows: Vec<Row> = people
            .iter()
            .map(|(age, name, score, city, email)| {
                Row::new(vec![
                    Value::Integer(*age),
                    Value::from(*name),
                    Value::Double(*score),
                    Value::from(*city),
                    Value::from(*email),
                ])
            })
            .collect();

        let store = SqliteStore::open_in_memory().unwrap();
        store.create_table(1, &columns).unwrap();
        store.insert_rows(1, &rows).unwrap();

        let names = ontask_core::column::column_names(&columns);
        let expected: Vec<Row> = rows
            .iter()
            .filter(|row| evaluate_bool(&formula, Some(&row.to_context(&names))).unwrap())
            .cloned()
            .collect();
        let selected = store.get_rows(1, Some(&formula), &names).unwrap();

        assert_eq!(selected, expected);
        assert_eq!(selected.len(), 2);
    }
}

//! Formula evaluation: one recursive fold, three backends.
//!
//! [`Formula::evaluate_with`] walks the tree and hands leaves and combined
//! children to a [`Backend`]. The three backends are:
//!
//! - [`BoolBackend`]: truth value against a [`Context`];
//! - [`SqlBackend`]: parameterized `WHERE` predicate ([`SqlPredicate`]);
//! - [`TextBackend`]: human-readable description.
//!
//! Each backend matches exhaustively on [`Operator`], so adding an operator
//! fails to compile until every mode handles it.

use std::cmp::Ordering;

use ontask_core::{Context, Value, ValueType};
use serde::{Deserialize, Serialize};

use crate::operator::Operator;
use crate::types::{Comparison, Conjunction, EvalError, Formula, Group, Operand, Result};

/// One evaluation strategy over the formula tree.
pub trait Backend {
    type Output;

    /// Evaluates a comparison leaf.
    fn leaf(&self, leaf: &Comparison) -> Result<Self::Output>;

    /// Combines the already-evaluated children of `group`.
    fn group(&self, group: &Group, children: Vec<Self::Output>) -> Result<Self::Output>;
}

impl Formula {
    /// Folds the tree with `backend`. Every child is evaluated (no
    /// short-circuit), so errors in any branch surface.
    pub fn evaluate_with<B: Backend>(&self, backend: &B) -> Result<B::Output> {
        match self {
            Self::Leaf(leaf) => backend.leaf(leaf),
            Self::Group(group) => {
                let children = group
                    .children
                    .iter()
                    .map(|child| child.evaluate_with(backend))
                    .collect::<Result<Vec<_>>>()?;
                backend.group(group, children)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Unified entry point
// ---------------------------------------------------------------------------

/// Evaluation strategy selector for [`evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalMode {
    Boolean,
    Sql,
    Text,
}

/// Result of [`evaluate`], one variant per [`EvalMode`].
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Bool(bool),
    Sql(SqlPredicate),
    Text(String),
}

/// Evaluates `node` in the given mode. `context` is only read in
/// [`EvalMode::Boolean`]; SQL uses `?` placeholders.
pub fn evaluate(node: &Formula, mode: EvalMode, context: Option<&Context>) -> Result<Evaluation> {
    match mode {
        EvalMode::Boolean => evaluate_bool(node, context).map(Evaluation::Bool),
        EvalMode::Sql => to_sql(node, PlaceholderStyle::Question).map(Evaluation::Sql),
        EvalMode::Text => to_text(node).map(Evaluation::Text),
    }
}

/// Truth value of `node`. Without a context every variable reads as null.
pub fn evaluate_bool(node: &Formula, context: Option<&Context>) -> Result<bool> {
    node.evaluate_with(&BoolBackend::new(context))
}

/// Compiles `node` into a predicate with `style` placeholders.
pub fn to_sql(node: &Formula, style: PlaceholderStyle) -> Result<SqlPredicate> {
    node.evaluate_with(&SqlBackend::new(style))
}

/// Like [`to_sql`], rejecting fields that are not in `columns`.
pub fn to_sql_checked(
    node: &Formula,
    style: PlaceholderStyle,
    columns: &[String],
) -> Result<SqlPredicate> {
    node.evaluate_with(&SqlBackend::new(style).with_columns(columns))
}

/// Human-readable description of `node`.
pub fn to_text(node: &Formula) -> Result<String> {
    node.evaluate_with(&TextBackend)
}

// ---------------------------------------------------------------------------
// Boolean backend
// ---------------------------------------------------------------------------

/// Evaluates leaves against a row context.
#[derive(Debug, Clone, Copy)]
pub struct BoolBackend<'a> {
    context: Option<&'a Context>,
}

impl<'a> BoolBackend<'a> {
    pub fn new(context: Option<&'a Context>) -> Self {
        Self { context }
    }

    /// `Ok(None)` when the value is null (or no context was given); a
    /// missing key is an error.
    fn lookup(&self, field: &str) -> Result<Option<&'a Value>> {
        let Some(context) = self.context else {
            return Ok(None);
        };
        let value = context
            .get(field)
            .ok_or_else(|| EvalError::MissingVariable(field.to_owned()))?;
        Ok((!value.is_null()).then_some(value))
    }
}

/// Reads a context value as the leaf's declared type where possible, so
/// text cells holding numbers or dates still compare.
fn as_declared(value: &Value, value_type: ValueType) -> Value {
    value_type.coerce(value).unwrap_or_else(|| value.clone())
}

fn order(leaf: &Comparison, value: &Value, constant: &Value) -> Result<Ordering> {
    value
        .compare(constant)
        .ok_or_else(|| EvalError::Incomparable {
            field: leaf.field.clone(),
            found: value.type_name(),
            value_type: leaf.value_type,
        })
}

impl Backend for BoolBackend<'_> {
    type Output = bool;

    fn leaf(&self, leaf: &Comparison) -> Result<bool> {
        let value = self.lookup(&leaf.field)?;
        leaf.check_type()?;

        match leaf.operator {
            Operator::Equal | Operator::NotEqual => {
                let constant = leaf.constant()?;
                let Some(v) = value else {
                    return Ok(false);
                };
                let equal = as_declared(v, leaf.value_type).loose_eq(&constant);
                Ok(equal == (leaf.operator == Operator::Equal))
            }
            Operator::BeginsWith
            | Operator::NotBeginsWith
            | Operator::Contains
            | Operator::NotContains
            | Operator::EndsWith
            | Operator::NotEndsWith => {
                let pattern = leaf.constant()?.to_string();
                let Some(v) = value else {
                    return Ok(false);
                };
                let text = v.to_string();
                Ok(match leaf.operator {
                    Operator::BeginsWith => text.starts_with(&pattern),
                    Operator::NotBeginsWith => !text.starts_with(&pattern),
                    Operator::Contains => text.contains(&pattern),
                    Operator::NotContains => !text.contains(&pattern),
                    Operator::EndsWith => text.ends_with(&pattern),
                    _ => !text.ends_with(&pattern),
                })
            }
            Operator::IsEmpty => Ok(value.is_some_and(|v| v.as_str() == Some(""))),
            Operator::IsNotEmpty => Ok(value.is_some_and(|v| v.as_str() != Some(""))),
            Operator::IsNull => Ok(value.is_none()),
            Operator::IsNotNull => Ok(value.is_some()),
            Operator::Less
            | Operator::LessOrEqual
            | Operator::Greater
            | Operator::GreaterOrEqual => {
                let constant = leaf.constant()?;
                let Some(v) = value else {
                    return Ok(false);
                };
                let ord = order(leaf, &as_declared(v, leaf.value_type), &constant)?;
                Ok(match leaf.operator {
                    Operator::Less => ord == Ordering::Less,
                    Operator::LessOrEqual => ord != Ordering::Greater,
                    Operator::Greater => ord == Ordering::Greater,
                    _ => ord != Ordering::Less,
                })
            }
            Operator::Between | Operator::NotBetween => {
                let (low, high) = leaf.range()?;
                let Some(v) = value else {
                    return Ok(false);
                };
                let v = as_declared(v, leaf.value_type);
                let inside = order(leaf, &v, &low)? != Ordering::Less
                    && order(leaf, &v, &high)? != Ordering::Greater;
                Ok(inside == (leaf.operator == Operator::Between))
            }
        }
    }

    fn group(&self, group: &Group, children: Vec<bool>) -> Result<bool> {
        let combined = match group.kind {
            Conjunction::And => children.iter().all(|c| *c),
            Conjunction::Or => children.iter().any(|c| *c),
        };
        Ok(combined != group.negate)
    }
}

// ---------------------------------------------------------------------------
// SQL backend
// ---------------------------------------------------------------------------

/// Placeholder syntax of the target driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderStyle {
    /// `?` (SQLite, rusqlite).
    #[default]
    Question,
    /// `%s` (psycopg-style). Literal `%` in identifiers is doubled.
    Format,
}

impl PlaceholderStyle {
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::Question => "?",
            Self::Format => "%s",
        }
    }
}

/// A `WHERE` fragment and its bound values, in placeholder order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlPredicate {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SqlPredicate {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// `true` when there is no predicate (select everything).
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// AND-combines non-empty predicates, concatenating their parameters.
    pub fn conjoin(predicates: impl IntoIterator<Item = SqlPredicate>) -> Self {
        combine(Conjunction::And, predicates.into_iter().collect())
    }
}

fn combine(kind: Conjunction, children: Vec<SqlPredicate>) -> SqlPredicate {
    let children: Vec<SqlPredicate> = children.into_iter().filter(|c| !c.is_empty()).collect();
    if children.is_empty() {
        return SqlPredicate::default();
    }
    let separator = format!(") {kind} (");
    let sql = format!(
        "(({}))",
        children
            .iter()
            .map(|c| c.sql.as_str())
            .collect::<Vec<_>>()
            .join(&separator)
    );
    let params = children.into_iter().flat_map(|c| c.params).collect();
    SqlPredicate { sql, params }
}

/// Escapes `LIKE` wildcards so the pattern matches literally under
/// `ESCAPE '\'`.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Compiles leaves into parameterized SQL.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlBackend<'a> {
    style: PlaceholderStyle,
    columns: Option<&'a [String]>,
}

impl<'a> SqlBackend<'a> {
    pub fn new(style: PlaceholderStyle) -> Self {
        Self {
            style,
            columns: None,
        }
    }

    /// Restricts fields to `columns`.
    pub fn with_columns(mut self, columns: &'a [String]) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Double-quoted identifier for `field`.
    fn quote(&self, field: &str) -> Result<String> {
        if let Some(columns) = self.columns {
            if !columns.iter().any(|c| c == field) {
                return Err(EvalError::UnknownColumn(field.to_owned()));
            }
        }
        let mut name = field.replace('"', "\"\"");
        if self.style == PlaceholderStyle::Format {
            name = name.replace('%', "%%");
        }
        Ok(format!("\"{name}\""))
    }
}

impl Backend for SqlBackend<'_> {
    type Output = SqlPredicate;

    fn leaf(&self, leaf: &Comparison) -> Result<SqlPredicate> {
        let f = self.quote(&leaf.field)?;
        let p = self.style.placeholder();

        let predicate = match leaf.operator {
            Operator::Equal => SqlPredicate::new(
                format!("({f} = {p}) AND ({f} is not null)"),
                vec![leaf.constant()?],
            ),
            Operator::NotEqual => SqlPredicate::new(
                format!("({f} != {p}) OR ({f} is null)"),
                vec![leaf.constant()?],
            ),
            Operator::BeginsWith | Operator::Contains | Operator::EndsWith => {
                let pattern = escape_like(&leaf.pattern()?);
                let pattern = match leaf.operator {
                    Operator::BeginsWith => format!("{pattern}%"),
                    Operator::Contains => format!("%{pattern}%"),
                    _ => format!("%{pattern}"),
                };
                SqlPredicate::new(
                    format!("({f} LIKE {p} ESCAPE '\\') AND ({f} is not null)"),
                    vec![Value::Text(pattern)],
                )
            }
            Operator::NotBeginsWith | Operator::NotContains | Operator::NotEndsWith => {
                let pattern = escape_like(&leaf.pattern()?);
                let pattern = match leaf.operator {
                    Operator::NotBeginsWith => format!("{pattern}%"),
                    Operator::NotContains => format!("%{pattern}%"),
                    _ => format!("%{pattern}"),
                };
                SqlPredicate::new(
                    format!("({f} NOT LIKE {p} ESCAPE '\\') OR ({f} is null)"),
                    vec![Value::Text(pattern)],
                )
            }
            Operator::IsEmpty => {
                SqlPredicate::new(format!("({f} = '') OR ({f} is null)"), vec![])
            }
            Operator::IsNotEmpty => {
                SqlPredicate::new(format!("({f} != '') AND ({f} is not null)"), vec![])
            }
            Operator::IsNull => SqlPredicate::new(format!("({f} is null)"), vec![]),
            Operator::IsNotNull => SqlPredicate::new(format!("({f} is not null)"), vec![]),
            Operator::Less => SqlPredicate::new(format!("{f} < {p}"), vec![leaf.constant()?]),
            Operator::LessOrEqual => {
                SqlPredicate::new(format!("{f} <= {p}"), vec![leaf.constant()?])
            }
            Operator::Greater => SqlPredicate::new(format!("{f} > {p}"), vec![leaf.constant()?]),
            Operator::GreaterOrEqual => {
                SqlPredicate::new(format!("{f} >= {p}"), vec![leaf.constant()?])
            }
            Operator::Between => {
                let (low, high) = leaf.range()?;
                SqlPredicate::new(format!("{f} BETWEEN {p} AND {p}"), vec![low, high])
            }
            Operator::NotBetween => {
                let (low, high) = leaf.range()?;
                SqlPredicate::new(format!("{f} NOT BETWEEN {p} AND {p}"), vec![low, high])
            }
        };
        Ok(predicate)
    }

    fn group(&self, group: &Group, children: Vec<SqlPredicate>) -> Result<SqlPredicate> {
        let mut combined = combine(group.kind, children);
        if group.negate && !combined.is_empty() {
            combined.sql = format!("(NOT ({}))", combined.sql);
        }
        Ok(combined)
    }
}

// ---------------------------------------------------------------------------
// Text backend
// ---------------------------------------------------------------------------

/// Describes leaves in plain English.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextBackend;

impl Backend for TextBackend {
    type Output = String;

    fn leaf(&self, leaf: &Comparison) -> Result<String> {
        let field = &leaf.field;
        let c = match &leaf.value {
            Operand::Single(v) => leaf.display(v),
            _ => String::new(),
        };

        let phrase = match leaf.operator {
            Operator::Equal => format!("{field} equal to {c}"),
            Operator::NotEqual => format!("{field} not equal to {c}"),
            Operator::BeginsWith => format!("{field} starts with {c}"),
            Operator::NotBeginsWith => format!("{field} does not start with {c}"),
            Operator::Contains => format!("{field} contains {c}"),
            Operator::NotContains => format!("{field} does not contain {c}"),
            Operator::EndsWith => format!("{field} ends with {c}"),
            Operator::NotEndsWith => format!("{field} does not end with {c}"),
            Operator::IsEmpty => format!("{field} is empty"),
            Operator::IsNotEmpty => format!("{field} is not empty"),
            Operator::IsNull => format!("{field} is null"),
            Operator::IsNotNull => format!("{field} is not null"),
            Operator::Less => format!("{field} is less than {c}"),
            Operator::LessOrEqual => format!("{field} is less than or equal to {c}"),
            Operator::Greater => format!("{field} is greater than {c}"),
            Operator::GreaterOrEqual => format!("{field} is greater than or equal to {c}"),
            Operator::Between | Operator::NotBetween => {
                let Operand::Range(low, high) = &leaf.value else {
                    return Err(EvalError::Arity {
                        field: field.clone(),
                        operator: leaf.operator,
                        expected: 2,
                    });
                };
                let verb = if leaf.operator == Operator::Between {
                    "is between"
                } else {
                    "is not between"
                };
                format!("{field} {verb} {} and {}", leaf.display(low), leaf.display(high))
            }
        };
        Ok(phrase)
    }

    fn group(&self, group: &Group, children: Vec<String>) -> Result<String> {
        let text = match children.len() {
            0 => return Ok(String::new()),
            1 => children.into_iter().next().unwrap_or_default(),
            _ => format!("({})", children.join(&format!(") {} (", group.kind))),
        };
        Ok(if group.negate {
            format!("NOT ({text})")
        } else {
            text
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ontask_core::ValueType;
    use pretty_assertions::assert_eq;

    fn ctx(pairs: &[(&str, Value)]) -> Context {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn eq(field: &str, value: impl Into<Value>) -> Formula {
        Formula::leaf(field, Operator::Equal, ValueType::String, value.into())
    }

    fn age(op: Operator, value: impl Into<Operand>) -> Formula {
        Formula::leaf("age", op, ValueType::Integer, value)
    }

    // -- boolean mode --------------------------------------------------------

    #[test]
    fn and_or_not_truth_table() {
        let c = ctx(&[("a", Value::from("x")), ("b", Value::from("y"))]);
        let a = eq("a", "x"); // true
        let b = eq("b", "nope"); // false

        let and = Formula::and(vec![a.clone(), b.clone()]);
        let or = Formula::or(vec![a, b]);
        assert!(!evaluate_bool(&and, Some(&c)).unwrap());
        assert!(evaluate_bool(&or, Some(&c)).unwrap());
        assert!(evaluate_bool(&and.negated(), Some(&c)).unwrap());
        assert!(!evaluate_bool(&or.negated(), Some(&c)).unwrap());
    }

    #[test]
    fn empty_groups() {
        assert!(evaluate_bool(&Formula::and(vec![]), None).unwrap());
        assert!(!evaluate_bool(&Formula::or(vec![]), None).unwrap());
    }

    #[test]
    fn between_boundaries() {
        let between = age(Operator::Between, (Value::Integer(10), Value::Integer(20)));
        let not_between = age(Operator::NotBetween, (Value::Integer(10), Value::Integer(20)));

        let at_low = ctx(&[("age", Value::Integer(10))]);
        assert!(evaluate_bool(&between, Some(&at_low)).unwrap());
        assert!(!evaluate_bool(&not_between, Some(&at_low)).unwrap());

        let below = ctx(&[("age", Value::Integer(9))]);
        assert!(!evaluate_bool(&between, Some(&below)).unwrap());
        assert!(evaluate_bool(&not_between, Some(&below)).unwrap());

        let at_high = ctx(&[("age", Value::Integer(20))]);
        assert!(evaluate_bool(&between, Some(&at_high)).unwrap());
    }

    #[test]
    fn missing_key_is_fatal_null_is_not() {
        let is_null = Formula::leaf("x", Operator::IsNull, ValueType::String, Operand::None);
        let c = ctx(&[("x", Value::Null)]);
        assert!(evaluate_bool(&is_null, Some(&c)).unwrap());

        let equal = eq("x", "a");
        assert!(!evaluate_bool(&equal, Some(&c)).unwrap());

        let empty = Context::new();
        assert_eq!(
            evaluate_bool(&equal, Some(&empty)).unwrap_err(),
            EvalError::MissingVariable("x".into())
        );
        assert!(evaluate_bool(&is_null, Some(&empty)).unwrap_err().is_missing_variable());
    }

    #[test]
    fn missing_key_in_any_branch_surfaces() {
        let c = ctx(&[("a", Value::from("x"))]);
        let f = Formula::or(vec![eq("a", "x"), eq("gone", "y")]);
        assert!(evaluate_bool(&f, Some(&c)).is_err());
    }

    #[test]
    fn no_context_reads_null() {
        let is_null = Formula::leaf("x", Operator::IsNull, ValueType::String, Operand::None);
        assert!(evaluate_bool(&is_null, None).unwrap());
        assert!(!evaluate_bool(&eq("x", "a"), None).unwrap());
    }

    #[test]
    fn ordering_rejects_string_type() {
        let f = Formula::leaf("name", Operator::Less, ValueType::String, Value::from("m"));
        let c = ctx(&[("name", Value::from("a"))]);
        assert_eq!(
            evaluate_bool(&f, Some(&c)).unwrap_err(),
            EvalError::TypeNotAllowed {
                operator: Operator::Less,
                value_type: ValueType::String,
            }
        );
    }

    #[test]
    fn pattern_rejects_non_string_type() {
        let f = Formula::leaf("n", Operator::Contains, ValueType::Integer, Value::Integer(1));
        let c = ctx(&[("n", Value::Integer(12))]);
        assert!(matches!(
            evaluate_bool(&f, Some(&c)),
            Err(EvalError::TypeNotAllowed { .. })
        ));
    }

    #[test]
    fn pattern_operators_are_case_sensitive() {
        let c = ctx(&[("email", Value::from("ada@example.org"))]);
        let leaf = |op, v: &str| Formula::leaf("email", op, ValueType::String, Value::from(v));
        assert!(evaluate_bool(&leaf(Operator::BeginsWith, "ada"), Some(&c)).unwrap());
        assert!(!evaluate_bool(&leaf(Operator::BeginsWith, "Ada"), Some(&c)).unwrap());
        assert!(evaluate_bool(&leaf(Operator::NotBeginsWith, "bob"), Some(&c)).unwrap());
        assert!(evaluate_bool(&leaf(Operator::Contains, "@example"), Some(&c)).unwrap());
        assert!(evaluate_bool(&leaf(Operator::NotContains, "gmail"), Some(&c)).unwrap());
        assert!(evaluate_bool(&leaf(Operator::EndsWith, ".org"), Some(&c)).unwrap());
        assert!(!evaluate_bool(&leaf(Operator::NotEndsWith, ".org"), Some(&c)).unwrap());
    }

    #[test]
    fn not_equal_on_null_is_false() {
        let f = Formula::leaf("x", Operator::NotEqual, ValueType::String, Value::from("a"));
        let c = ctx(&[("x", Value::Null)]);
        assert!(!evaluate_bool(&f, Some(&c)).unwrap());
    }

    #[test]
    fn empty_checks() {
        let empty = Formula::leaf("s", Operator::IsEmpty, ValueType::String, Operand::None);
        let not_empty = Formula::leaf("s", Operator::IsNotEmpty, ValueType::String, Operand::None);
        let blank = ctx(&[("s", Value::from(""))]);
        let full = ctx(&[("s", Value::from("x"))]);
        let null = ctx(&[("s", Value::Null)]);
        assert!(evaluate_bool(&empty, Some(&blank)).unwrap());
        assert!(!evaluate_bool(&empty, Some(&full)).unwrap());
        assert!(!evaluate_bool(&empty, Some(&null)).unwrap());
        assert!(evaluate_bool(&not_empty, Some(&full)).unwrap());
        assert!(!evaluate_bool(&not_empty, Some(&null)).unwrap());
    }

    #[test]
    fn numeric_comparisons_coerce_text_cells() {
        let c = ctx(&[("age", Value::from("21"))]);
        assert!(evaluate_bool(&age(Operator::Greater, Value::from("18")), Some(&c)).unwrap());
        assert!(evaluate_bool(&age(Operator::GreaterOrEqual, Value::Integer(21)), Some(&c)).unwrap());
        assert!(!evaluate_bool(&age(Operator::Less, Value::Integer(21)), Some(&c)).unwrap());
        assert!(evaluate_bool(&age(Operator::LessOrEqual, Value::Integer(21)), Some(&c)).unwrap());
    }

    #[test]
    fn incomparable_value_is_an_error() {
        let c = ctx(&[("age", Value::from("old"))]);
        assert!(matches!(
            evaluate_bool(&age(Operator::Greater, Value::Integer(18)), Some(&c)),
            Err(EvalError::Incomparable { .. })
        ));
    }

    #[test]
    fn datetime_comparison() {
        let when = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let c = ctx(&[("due", Value::DateTime(when))]);
        let f = Formula::leaf(
            "due",
            Operator::Less,
            ValueType::Datetime,
            Value::from("2024-03-02T00:00:00Z"),
        );
        assert!(evaluate_bool(&f, Some(&c)).unwrap());
    }

    #[test]
    fn boolean_equality() {
        let c = ctx(&[("passed", Value::Bool(true))]);
        let f = Formula::leaf("passed", Operator::Equal, ValueType::Boolean, Value::Integer(1));
        assert!(evaluate_bool(&f, Some(&c)).unwrap());
    }

    // -- SQL mode ------------------------------------------------------------

    #[test]
    fn sql_equal_leaf() {
        let p = to_sql(&eq("name", "Ada"), PlaceholderStyle::Question).unwrap();
        assert_eq!(p.sql, r#"("name" = ?) AND ("name" is not null)"#);
        assert_eq!(p.params, vec![Value::from("Ada")]);
    }

    #[test]
    fn sql_group_parenthesizes_and_concatenates() {
        let f = Formula::and(vec![
            eq("a", "x"),
            age(Operator::Between, (Value::Integer(1), Value::Integer(5))),
        ]);
        let p = to_sql(&f, PlaceholderStyle::Question).unwrap();
        assert_eq!(
            p.sql,
            r#"((("a" = ?) AND ("a" is not null)) AND ("age" BETWEEN ? AND ?))"#
        );
        assert_eq!(
            p.params,
            vec![Value::from("x"), Value::Integer(1), Value::Integer(5)]
        );
    }

    #[test]
    fn sql_negated_or() {
        let f = Formula::or(vec![
            Formula::leaf("a", Operator::IsNull, ValueType::String, Operand::None),
            Formula::leaf("b", Operator::IsEmpty, ValueType::String, Operand::None),
        ])
        .negated();
        let p = to_sql(&f, PlaceholderStyle::Question).unwrap();
        assert_eq!(
            p.sql,
            r#"(NOT (((("a" is null)) OR (("b" = '') OR ("b" is null)))))"#
        );
        assert!(p.params.is_empty());
    }

    #[test]
    fn sql_empty_group_is_empty_predicate() {
        let p = to_sql(&Formula::and(vec![]), PlaceholderStyle::Question).unwrap();
        assert_eq!(p, SqlPredicate::default());
        let p = to_sql(&Formula::or(vec![]).negated(), PlaceholderStyle::Question).unwrap();
        assert!(p.is_empty());
    }

    #[test]
    fn sql_like_patterns_escape_wildcards() {
        let f = Formula::leaf("code", Operator::Contains, ValueType::String, Value::from("50%_off"));
        let p = to_sql(&f, PlaceholderStyle::Question).unwrap();
        assert_eq!(p.sql, r#"("code" LIKE ? ESCAPE '\') AND ("code" is not null)"#);
        assert_eq!(p.params, vec![Value::from(r"%50\%\_off%")]);

        let f = Formula::leaf("code", Operator::NotBeginsWith, ValueType::String, Value::from("A"));
        let p = to_sql(&f, PlaceholderStyle::Question).unwrap();
        assert_eq!(p.sql, r#"("code" NOT LIKE ? ESCAPE '\') OR ("code" is null)"#);
        assert_eq!(p.params, vec![Value::from("A%")]);
    }

    #[test]
    fn sql_format_style_escapes_percent_in_names() {
        let f = Formula::leaf("100% done", Operator::Greater, ValueType::Double, Value::from("0.5"));
        let p = to_sql(&f, PlaceholderStyle::Format).unwrap();
        assert_eq!(p.sql, r#""100%% done" > %s"#);
        assert_eq!(p.params, vec![Value::Double(0.5)]);
    }

    #[test]
    fn sql_quotes_embedded_quotes() {
        let p = to_sql(&eq(r#"say "hi""#, "x"), PlaceholderStyle::Question).unwrap();
        assert!(p.sql.starts_with(r#"("say ""hi""" = ?)"#));
    }

    #[test]
    fn sql_checked_rejects_unknown_columns() {
        let columns = vec!["name".to_string()];
        assert!(to_sql_checked(&eq("name", "x"), PlaceholderStyle::Question, &columns).is_ok());
        assert_eq!(
            to_sql_checked(&eq("nmae", "x"), PlaceholderStyle::Question, &columns).unwrap_err(),
            EvalError::UnknownColumn("nmae".into())
        );
    }

    #[test]
    fn conjoin_skips_empty_predicates() {
        let a = SqlPredicate::new("x = ?", vec![Value::Integer(1)]);
        let p = SqlPredicate::conjoin([SqlPredicate::default(), a.clone()]);
        assert_eq!(p.sql, "((x = ?))");
        assert_eq!(p.params, a.params);
        assert!(SqlPredicate::conjoin([]).is_empty());
    }

    // -- text mode -----------------------------------------------------------

    #[test]
    fn text_leaf_phrases() {
        assert_eq!(
            to_text(&age(Operator::Greater, Value::from("18"))).unwrap(),
            "age is greater than 18"
        );
        assert_eq!(
            to_text(&age(Operator::NotBetween, (Value::Integer(1), Value::Integer(3)))).unwrap(),
            "age is not between 1 and 3"
        );
    }

    #[test]
    fn text_groups() {
        let single = Formula::and(vec![eq("a", "x")]);
        assert_eq!(to_text(&single).unwrap(), "a equal to x");

        let pair = Formula::or(vec![eq("a", "x"), eq("b", "y")]).negated();
        assert_eq!(
            to_text(&pair).unwrap(),
            "NOT ((a equal to x) OR (b equal to y))"
        );
        assert_eq!(to_text(&Formula::and(vec![])).unwrap(), "");
    }

    #[test]
    fn text_names_every_variable() {
        let f = Formula::and(vec![
            Formula::or(vec![
                age(Operator::Greater, Value::Integer(18)),
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
                    age(Operator::Less, Value::Integer(65)),
                ]),
            ]),
        ]);

        let text = to_text(&f).unwrap();
        let names = f.collect_variables();
        assert_eq!(names, vec!["age", "first name", "score", "city", "email", "age"]);
        for name in &names {
            assert!(text.contains(name.as_str()), "{name} missing from {text}");
        }
        assert!(text.starts_with("(NOT ("), "{text}");
    }

    // -- all modes -----------------------------------------------------------

    #[test]
    fn every_operator_handled_in_every_mode() {
        let c = ctx(&[("n", Value::Integer(5))]);
        for op in Operator::ALL {
            let value_type = if op.is_pattern() {
                ValueType::String
            } else {
                ValueType::Integer
            };
            let value = match op.arity() {
                0 => Operand::None,
                1 => Operand::Single(Value::Integer(5)),
                _ => Operand::Range(Value::Integer(1), Value::Integer(9)),
            };
            let f = Formula::leaf("n", *op, value_type, value);
            for mode in [EvalMode::Boolean, EvalMode::Sql, EvalMode::Text] {
                let result = evaluate(&f, mode, Some(&c));
                assert!(result.is_ok(), "{op} failed in {mode:?}: {result:?}");
            }
        }
    }

    #[test]
    fn unified_entry_point() {
        let f = eq("a", "x");
        let c = ctx(&[("a", Value::from("x"))]);
        assert_eq!(
            evaluate(&f, EvalMode::Boolean, Some(&c)).unwrap(),
            Evaluation::Bool(true)
        );
        assert!(matches!(
            evaluate(&f, EvalMode::Sql, None).unwrap(),
            Evaluation::Sql(_)
        ));
        assert_eq!(
            evaluate(&f, EvalMode::Text, None).unwrap(),
            Evaluation::Text("a equal to x".into())
        );
    }
}

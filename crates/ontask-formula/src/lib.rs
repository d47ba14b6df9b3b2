//! Rule formula engine for OnTask.
//!
//! A formula is a tree of AND/OR groups (optionally negated) whose leaves
//! compare a named variable against a typed constant. The same tree can be
//! evaluated three ways:
//!
//! - against a [`Context`](ontask_core::Context), yielding a boolean;
//! - compiled into a parameterized SQL `WHERE` predicate;
//! - rendered as a human-readable description.
//!
//! Formulas persist in the nested-mapping convention of the visual rule
//! builder; see [`rulebuilder`].

pub mod engine;
pub mod operator;
pub mod rulebuilder;
pub mod types;
pub mod variables;

pub use engine::{
    evaluate, evaluate_bool, to_sql, to_sql_checked, to_text, Backend, BoolBackend, EvalMode,
    Evaluation, PlaceholderStyle, SqlBackend, SqlPredicate, TextBackend,
};
pub use operator::Operator;
pub use rulebuilder::parse_json;
pub use types::{Comparison, Conjunction, EvalError, Formula, Group, Operand, Result};
pub use variables::{collect_variables, contains_variable, rename_variable};

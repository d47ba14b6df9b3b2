//! Formula data model: groups, comparison leaves and evaluation errors.

use std::fmt;

use ontask_core::{Value, ValueType};
use serde::{Deserialize, Serialize};

use crate::operator::Operator;
use crate::rulebuilder::RawNode;

/// How a group combines its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constant operand(s) of a comparison, matching the operator's arity.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Operand {
    #[default]
    None,
    Single(Value),
    /// Inclusive `[low, high]` bounds.
    Range(Value, Value),
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Self::Single(v)
    }
}

impl<L: Into<Value>, H: Into<Value>> From<(L, H)> for Operand {
    fn from((low, high): (L, H)) -> Self {
        Self::Range(low.into(), high.into())
    }
}

/// A leaf: `field <operator> value`, with `value` read as `value_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub field: String,
    pub operator: Operator,
    pub value_type: ValueType,
    pub value: Operand,
}

impl Comparison {
    pub fn new(
        field: impl Into<String>,
        operator: Operator,
        value_type: ValueType,
        value: impl Into<Operand>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value_type,
            value: value.into(),
        }
    }

    /// The single operand coerced to the declared type.
    pub fn constant(&self) -> Result<Value> {
        match &self.value {
            Operand::Single(v) => self.coerce(v),
            _ => Err(self.arity_error()),
        }
    }

    /// The two range bounds coerced to the declared type.
    pub fn range(&self) -> Result<(Value, Value)> {
        match &self.value {
            Operand::Range(low, high) => Ok((self.coerce(low)?, self.coerce(high)?)),
            _ => Err(self.arity_error()),
        }
    }

    /// The single operand as raw text, used for SQL `LIKE` patterns.
    pub fn pattern(&self) -> Result<String> {
        match &self.value {
            Operand::Single(v) if !v.is_null() => Ok(v.to_string()),
            Operand::Single(v) => Err(self.invalid_constant(v)),
            _ => Err(self.arity_error()),
        }
    }

    /// Display form of an operand: coerced when possible, raw otherwise.
    pub(crate) fn display(&self, v: &Value) -> String {
        self.value_type
            .coerce(v)
            .map_or_else(|| v.to_string(), |c| c.to_string())
    }

    /// Errors unless the declared type is compatible with the operator.
    pub(crate) fn check_type(&self) -> Result<()> {
        if self.operator.accepts(self.value_type) {
            Ok(())
        } else {
            Err(EvalError::TypeNotAllowed {
                operator: self.operator,
                value_type: self.value_type,
            })
        }
    }

    fn coerce(&self, v: &Value) -> Result<Value> {
        self.value_type
            .coerce(v)
            .ok_or_else(|| self.invalid_constant(v))
    }

    fn invalid_constant(&self, v: &Value) -> EvalError {
        EvalError::InvalidConstant {
            field: self.field.clone(),
            value_type: self.value_type,
            value: v.to_string(),
        }
    }

    fn arity_error(&self) -> EvalError {
        EvalError::Arity {
            field: self.field.clone(),
            operator: self.operator,
            expected: self.operator.arity(),
        }
    }
}

/// An AND/OR combination of child formulas.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub kind: Conjunction,
    /// Negates the combined result (not each child).
    pub negate: bool,
    pub children: Vec<Formula>,
}

/// A rule tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub enum Formula {
    Group(Group),
    Leaf(Comparison),
}

impl Formula {
    /// Conjunction of `children`.
    pub fn and(children: Vec<Formula>) -> Self {
        Self::Group(Group {
            kind: Conjunction::And,
            negate: false,
            children,
        })
    }

    /// Disjunction of `children`.
    pub fn or(children: Vec<Formula>) -> Self {
        Self::Group(Group {
            kind: Conjunction::Or,
            negate: false,
            children,
        })
    }

    /// A single comparison.
    pub fn leaf(
        field: impl Into<String>,
        operator: Operator,
        value_type: ValueType,
        value: impl Into<Operand>,
    ) -> Self {
        Self::Leaf(Comparison::new(field, operator, value_type, value))
    }

    /// Negated copy of this formula. A leaf is wrapped in a one-child group.
    pub fn negated(self) -> Self {
        match self {
            Self::Group(mut g) => {
                g.negate = !g.negate;
                Self::Group(g)
            }
            leaf @ Self::Leaf(_) => Self::Group(Group {
                kind: Conjunction::And,
                negate: true,
                children: vec![leaf],
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while parsing or evaluating formulas.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// The variable is not a key of the supplied context.
    #[error("no value found for variable {0}")]
    MissingVariable(String),

    /// The declared type cannot be used with the operator.
    #[error("evaluation error: type {value_type} not allowed with operator {operator}")]
    TypeNotAllowed {
        operator: Operator,
        value_type: ValueType,
    },

    /// A constant cannot be read as the declared type.
    #[error("invalid {value_type} constant for {field}: {value:?}")]
    InvalidConstant {
        field: String,
        value_type: ValueType,
        value: String,
    },

    /// The operand shape does not match the operator.
    #[error("operator {operator} on {field} expects {expected} operand(s)")]
    Arity {
        field: String,
        operator: Operator,
        expected: usize,
    },

    /// The variable holds a value that cannot be ordered against the constant.
    #[error("cannot compare {field} ({found}) with a {value_type} constant")]
    Incomparable {
        field: String,
        found: &'static str,
        value_type: ValueType,
    },

    /// A field is not a column of the queried table.
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// The persisted representation could not be read.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Convenience alias used throughout the formula crate.
pub type Result<T> = std::result::Result<T, EvalError>;

impl EvalError {
    /// Returns `true` for [`EvalError::MissingVariable`].
    pub fn is_missing_variable(&self) -> bool {
        matches!(self, Self::MissingVariable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn constant_coerces_to_declared_type() {
        let c = Comparison::new("age", Operator::Greater, ValueType::Integer, Value::from("18"));
        assert_eq!(c.constant().unwrap(), Value::Integer(18));
    }

    #[test]
    fn constant_rejects_bad_literal() {
        let c = Comparison::new("age", Operator::Greater, ValueType::Integer, Value::from("x"));
        assert!(matches!(c.constant(), Err(EvalError::InvalidConstant { .. })));
    }

    #[test]
    fn range_requires_two_operands() {
        let c = Comparison::new("age", Operator::Between, ValueType::Integer, Value::Integer(1));
        assert_eq!(
            c.range().unwrap_err(),
            EvalError::Arity {
                field: "age".into(),
                operator: Operator::Between,
                expected: 2,
            }
        );
        let c = Comparison::new("age", Operator::Between, ValueType::Integer, (10_i64, "20"));
        assert_eq!(c.range().unwrap(), (Value::Integer(10), Value::Integer(20)));
    }

    #[test]
    fn negated_leaf_becomes_group() {
        let f = Formula::leaf("x", Operator::IsNull, ValueType::String, Operand::None).negated();
        match f {
            Formula::Group(g) => {
                assert!(g.negate);
                assert_eq!(g.children.len(), 1);
            }
            Formula::Leaf(_) => panic!("expected group"),
        }
    }

    #[test]
    fn double_negation_cancels() {
        let f = Formula::and(vec![]).negated().negated();
        assert_eq!(f, Formula::and(vec![]));
    }
}

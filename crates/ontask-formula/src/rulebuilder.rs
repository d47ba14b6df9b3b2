//! Persistence adapter for the visual rule builder's nested-mapping format.
//!
//! Groups:
//!
//! ```json
//! {"condition": "AND", "not": false, "rules": [ ... ], "valid": true}
//! ```
//!
//! Leaves:
//!
//! ```json
//! {"id": "age", "field": "age", "type": "integer", "input": "number",
//!  "operator": "between", "value": ["10", "20"]}
//! ```
//!
//! [`Formula`] converts through [`RawNode`] with `#[serde(try_from, into)]`,
//! so the shape checks (operand arity, known operators and types) happen once
//! at the boundary and the evaluator works on the typed tree.

use ontask_core::{Value, ValueType};
use serde::{Deserialize, Serialize};

use crate::operator::Operator;
use crate::types::{Comparison, Conjunction, EvalError, Formula, Group, Operand, Result};

/// Wire form of a formula node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNode {
    Group(RawGroup),
    Leaf(RawLeaf),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawGroup {
    pub condition: String,
    #[serde(default)]
    pub not: bool,
    #[serde(default)]
    pub rules: Vec<RawNode>,
    #[serde(default = "default_valid")]
    pub valid: bool,
}

fn default_valid() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLeaf {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub field: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RawOperand>,
}

/// A scalar or a list of scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawOperand {
    Range(Vec<Value>),
    Single(Value),
}

// ---------------------------------------------------------------------------
// Raw -> typed
// ---------------------------------------------------------------------------

impl TryFrom<RawNode> for Formula {
    type Error = EvalError;

    fn try_from(raw: RawNode) -> Result<Self> {
        match raw {
            RawNode::Group(g) => {
                let kind = match g.condition.as_str() {
                    "AND" => Conjunction::And,
                    "OR" => Conjunction::Or,
                    other => {
                        return Err(EvalError::Parse(format!("unknown condition: {other}")));
                    }
                };
                let children = g
                    .rules
                    .into_iter()
                    .map(Formula::try_from)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Formula::Group(Group {
                    kind,
                    negate: g.not,
                    children,
                }))
            }
            RawNode::Leaf(l) => Ok(Formula::Leaf(leaf_from_raw(l)?)),
        }
    }
}

fn leaf_from_raw(raw: RawLeaf) -> Result<Comparison> {
    let field = if raw.field.is_empty() { raw.id } else { raw.field };
    if field.is_empty() {
        return Err(EvalError::Parse("rule without a field".into()));
    }

    let shape_error = || EvalError::Arity {
        field: field.clone(),
        operator: raw.operator,
        expected: raw.operator.arity(),
    };

    let value = match (raw.operator.arity(), raw.value) {
        // No-input operators ignore whatever the builder left behind.
        (0, _) => Operand::None,
        (1, Some(RawOperand::Single(v))) => Operand::Single(v),
        (1, Some(RawOperand::Range(mut vs))) if vs.len() == 1 => {
            Operand::Single(vs.pop().unwrap_or_default())
        }
        (2, Some(RawOperand::Range(vs))) if vs.len() == 2 => {
            let mut it = vs.into_iter();
            Operand::Range(it.next().unwrap_or_default(), it.next().unwrap_or_default())
        }
        _ => return Err(shape_error()),
    };

    Ok(Comparison {
        field,
        operator: raw.operator,
        value_type: raw.value_type,
        value,
    })
}

// ---------------------------------------------------------------------------
// Typed -> raw
// ---------------------------------------------------------------------------

/// Input widget the rule builder uses for a declared type.
fn input_for(value_type: ValueType) -> &'static str {
    match value_type {
        ValueType::Integer | ValueType::Double => "number",
        ValueType::Boolean => "radio",
        ValueType::String | ValueType::Datetime => "text",
    }
}

impl From<Formula> for RawNode {
    fn from(node: Formula) -> Self {
        match node {
            Formula::Group(g) => RawNode::Group(RawGroup {
                condition: g.kind.as_str().to_owned(),
                not: g.negate,
                rules: g.children.into_iter().map(RawNode::from).collect(),
                valid: true,
            }),
            Formula::Leaf(c) => RawNode::Leaf(RawLeaf {
                id: c.field.clone(),
                field: c.field,
                value_type: c.value_type,
                input: Some(input_for(c.value_type).to_owned()),
                operator: c.operator,
                value: match c.value {
                    Operand::None => None,
                    Operand::Single(v) => Some(RawOperand::Single(v)),
                    Operand::Range(low, high) => Some(RawOperand::Range(vec![low, high])),
                },
            }),
        }
    }
}

/// Parses a formula from rule-builder JSON.
pub fn parse_json(s: &str) -> Result<Formula> {
    serde_json::from_str(s).map_err(|e| EvalError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_nested_groups() {
        let f = parse_json(
            r#"{
                "condition": "OR", "not": true, "valid": true,
                "rules": [
                    {"id": "age", "field": "age", "type": "integer", "input": "number",
                     "operator": "between", "value": ["10", "20"]},
                    {"condition": "AND", "rules": [
                        {"id": "email", "field": "email", "type": "string", "input": "text",
                         "operator": "is_null", "value": null}
                    ]}
                ]
            }"#,
        )
        .unwrap();

        let expected = Formula::or(vec![
            Formula::leaf(
                "age",
                Operator::Between,
                ValueType::Integer,
                (Value::from("10"), Value::from("20")),
            ),
            Formula::and(vec![Formula::leaf(
                "email",
                Operator::IsNull,
                ValueType::String,
                Operand::None,
            )]),
        ])
        .negated();
        assert_eq!(f, expected);
    }

    #[test]
    fn serializes_with_synchronized_id() {
        let f = Formula::and(vec![Formula::leaf(
            "score",
            Operator::Greater,
            ValueType::Double,
            Value::from("4.5"),
        )]);
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(
            v,
            json!({
                "condition": "AND",
                "not": false,
                "rules": [{
                    "id": "score", "field": "score", "type": "double", "input": "number",
                    "operator": "greater", "value": "4.5"
                }],
                "valid": true
            })
        );
    }

    #[test]
    fn rename_updates_id_and_field() {
        let f = parse_json(
            r#"{"id": "old", "field": "old", "type": "string", "operator": "equal", "value": "x"}"#,
        )
        .unwrap();
        let v = serde_json::to_value(f.rename_variable("old", "new")).unwrap();
        assert_eq!(v["id"], "new");
        assert_eq!(v["field"], "new");
    }

    #[test]
    fn field_falls_back_to_id() {
        let f = parse_json(r#"{"id": "x", "type": "boolean", "operator": "is_not_null"}"#).unwrap();
        assert!(f.contains_variable("x"));
    }

    #[test]
    fn rejects_unknown_names() {
        assert!(parse_json(r#"{"condition": "XOR", "rules": []}"#).is_err());
        assert!(
            parse_json(r#"{"field": "a", "type": "string", "operator": "like", "value": "x"}"#)
                .is_err()
        );
        assert!(
            parse_json(r#"{"field": "a", "type": "text", "operator": "equal", "value": "x"}"#)
                .is_err()
        );
    }

    #[test]
    fn rejects_wrong_operand_shape() {
        assert!(
            parse_json(r#"{"field": "a", "type": "integer", "operator": "between", "value": 3}"#)
                .is_err()
        );
        assert!(
            parse_json(r#"{"field": "a", "type": "integer", "operator": "less"}"#).is_err()
        );
    }

    #[test]
    fn boolean_leaf_uses_radio_input() {
        let f = Formula::leaf("ok", Operator::Equal, ValueType::Boolean, Value::Bool(true));
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(v["input"], "radio");
        assert_eq!(v["value"], true);
    }
}

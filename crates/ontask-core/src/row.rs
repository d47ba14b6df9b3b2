//! Data rows and evaluation contexts.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Flat name → value mapping used for formula evaluation and rendering.
pub type Context = HashMap<String, Value>;

/// An ordered tuple of cell values, positionally paired with the owning
/// table's column names.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(pub Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pairs the cells with `columns`. Extra cells or extra names are dropped.
    pub fn to_context(&self, columns: &[String]) -> Context {
        columns.iter().cloned().zip(self.0.iter().cloned()).collect()
    }

    /// Consuming variant of [`Row::to_context`].
    pub fn into_context(self, columns: &[String]) -> Context {
        columns.iter().cloned().zip(self.0).collect()
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pairs_values_with_columns() {
        let row = Row::new(vec![Value::from("Ada"), Value::Integer(36)]);
        let columns = vec!["first name".to_string(), "age".to_string()];
        let ctx = row.to_context(&columns);
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx["first name"], Value::from("Ada"));
        assert_eq!(ctx["age"], Value::Integer(36));
        assert_eq!(row.into_context(&columns), ctx);
    }

    #[test]
    fn short_column_list_truncates() {
        let row = Row::new(vec![Value::Integer(1), Value::Integer(2)]);
        let ctx = row.to_context(&["a".to_string()]);
        assert_eq!(ctx.len(), 1);
    }
}

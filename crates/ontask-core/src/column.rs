//! Table column metadata.

use serde::{Deserialize, Serialize};

use crate::value::ValueType;

/// A column of a workflow's data table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,

    /// Declared type of the cells.
    #[serde(default = "default_data_type")]
    pub data_type: ValueType,

    /// Whether the column holds unique values usable as a row key.
    #[serde(default)]
    pub is_key: bool,
}

fn default_data_type() -> ValueType {
    ValueType::String
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: ValueType) -> Self {
        Self {
            name: name.into(),
            data_type,
            is_key: false,
        }
    }

    /// Builder-style setter for [`Column::is_key`].
    pub fn key(mut self) -> Self {
        self.is_key = true;
        self
    }
}

/// Names of `columns`, in order.
pub fn column_names(columns: &[Column]) -> Vec<String> {
    columns.iter().map(|c| c.name.clone()).collect()
}

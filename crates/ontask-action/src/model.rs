//! Workflow metadata: columns, attributes, actions and their conditions.
//!
//! These are plain serde types; workflows are loaded from YAML or JSON
//! documents and never persisted by this crate.

use std::collections::{BTreeMap, HashSet};

use ontask_core::{Column, Value};
use ontask_formula::Formula;
use ontask_template::rename_template_variable;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ActionError, Result};

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// A named formula attached to an action.
///
/// A filter condition selects the rows the action applies to; every other
/// condition becomes a boolean variable in the rendering context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description_text: String,

    /// Rule tree, persisted in the rule-builder format.
    pub formula: Formula,

    #[serde(default)]
    pub is_filter: bool,

    /// Rows selected by this condition (combined with the action filter),
    /// refreshed by [`update_n_rows_selected`](crate::update_n_rows_selected).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_rows_selected: Option<usize>,
}

impl Condition {
    pub fn new(name: impl Into<String>, formula: Formula) -> Self {
        Self {
            name: name.into(),
            description_text: String::new(),
            formula,
            is_filter: false,
            n_rows_selected: None,
        }
    }

    /// Builder-style constructor for a filter condition.
    pub fn filter(name: impl Into<String>, formula: Formula) -> Self {
        Self {
            is_filter: true,
            ..Self::new(name, formula)
        }
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Direction of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// Personalized text sent to each selected row.
    #[default]
    Out,
    /// Data-entry form collecting values for a set of columns.
    In,
}

/// A column exposed by an input action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionColumn {
    pub name: String,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl ActionColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_active: true,
        }
    }
}

/// A personalized text (out) or data-entry form (in).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,

    #[serde(default)]
    pub action_type: ActionType,

    /// Template text rendered for every selected row.
    #[serde(default)]
    pub content: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description_text: String,

    #[serde(default)]
    pub conditions: Vec<Condition>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ActionColumn>,
}

impl Action {
    /// An output action with the given template text.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action_type: ActionType::Out,
            content: content.into(),
            description_text: String::new(),
            conditions: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn is_in(&self) -> bool {
        self.action_type == ActionType::In
    }

    /// The filter condition, if any.
    pub fn filter(&self) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.is_filter)
    }

    /// The filter formula, if any.
    pub fn filter_formula(&self) -> Option<&Formula> {
        self.filter().map(|c| &c.formula)
    }

    /// Non-filter conditions, in declaration order.
    pub fn named_conditions(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.iter().filter(|c| !c.is_filter)
    }

    /// Active input columns.
    pub fn active_columns(&self) -> impl Iterator<Item = &ActionColumn> {
        self.columns.iter().filter(|c| c.is_active)
    }

    /// Rewrites references to `old` in the text and every condition.
    pub fn rename_variable(&mut self, old: &str, new: &str) {
        self.content = rename_template_variable(&self.content, old, new);
        for condition in &mut self.conditions {
            condition.formula = condition.formula.rename_variable(old, new);
        }
        for column in &mut self.columns {
            if column.name == old {
                column.name = new.to_owned();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// A data table description plus the actions defined over it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: i64,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub columns: Vec<Column>,

    /// Workflow-wide named constants available to every template.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,

    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Workflow {
    pub fn new(id: i64, name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            id,
            name: name.into(),
            columns,
            attributes: BTreeMap::new(),
            actions: Vec::new(),
        }
    }

    /// Column names, in table order.
    pub fn column_names(&self) -> Vec<String> {
        ontask_core::column::column_names(&self.columns)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    pub fn action_mut(&mut self, name: &str) -> Option<&mut Action> {
        self.actions.iter_mut().find(|a| a.name == name)
    }

    /// Checks the naming rules the rendering context relies on.
    ///
    /// Column and attribute names are unique and disjoint. Within each
    /// action there is at most one filter, condition names are unique, and
    /// no non-filter condition shares a name with a column or attribute.
    pub fn validate_names(&self) -> Result<()> {
        let mut seen: HashSet<&str> = HashSet::new();
        for column in &self.columns {
            if !seen.insert(&column.name) {
                return Err(ActionError::Validation(format!(
                    "duplicate column name {:?}",
                    column.name
                )));
            }
        }
        for name in self.attributes.keys() {
            if !seen.insert(name) {
                return Err(ActionError::Validation(format!(
                    "attribute {name:?} has the same name as a column"
                )));
            }
        }

        for action in &self.actions {
            if action.conditions.iter().filter(|c| c.is_filter).count() > 1 {
                return Err(ActionError::Validation(format!(
                    "action {:?} has more than one filter",
                    action.name
                )));
            }
            let mut names: HashSet<&str> = HashSet::new();
            for condition in &action.conditions {
                if !names.insert(&condition.name) {
                    return Err(ActionError::Validation(format!(
                        "action {:?} has two conditions named {:?}",
                        action.name, condition.name
                    )));
                }
                if !condition.is_filter && seen.contains(condition.name.as_str()) {
                    return Err(ActionError::Validation(format!(
                        "condition {:?} in action {:?} has the same name as a column or attribute",
                        condition.name, action.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Renames a column or attribute and every reference to it in condition
    /// formulas, action texts and input columns.
    ///
    /// The data table itself is not touched; rename the store column
    /// separately (see `SqliteStore::rename_column`).
    pub fn rename_variable(&mut self, old: &str, new: &str) -> Result<()> {
        if old == new {
            return Ok(());
        }
        let taken = self.column(new).is_some() || self.attributes.contains_key(new);
        if taken {
            return Err(ActionError::Validation(format!("name {new:?} is already in use")));
        }

        if let Some(column) = self.columns.iter_mut().find(|c| c.name == old) {
            column.name = new.to_owned();
        } else if let Some(value) = self.attributes.remove(old) {
            self.attributes.insert(new.to_owned(), value);
        } else {
            return Err(ActionError::Validation(format!(
                "no column or attribute named {old:?}"
            )));
        }

        for action in &mut self.actions {
            action.rename_variable(old, new);
        }
        debug!(workflow = self.id, old, new, "renamed variable");
        Ok(())
    }
}

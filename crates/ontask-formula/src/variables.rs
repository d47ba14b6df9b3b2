//! Variable queries and rewrites over formula trees.

use crate::types::{Formula, Group};

impl Formula {
    /// Returns `true` if any leaf compares `name`.
    pub fn contains_variable(&self, name: &str) -> bool {
        match self {
            Self::Leaf(leaf) => leaf.field == name,
            Self::Group(group) => group.children.iter().any(|c| c.contains_variable(name)),
        }
    }

    /// Field names of all leaves in pre-order. Duplicates are kept.
    pub fn collect_variables(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out
    }

    fn collect_into(&self, out: &mut Vec<String>) {
        match self {
            Self::Leaf(leaf) => out.push(leaf.field.clone()),
            Self::Group(group) => {
                for child in &group.children {
                    child.collect_into(out);
                }
            }
        }
    }

    /// Copy of this tree with every leaf on `old` moved to `new`.
    pub fn rename_variable(&self, old: &str, new: &str) -> Formula {
        match self {
            Self::Leaf(leaf) => {
                let mut leaf = leaf.clone();
                if leaf.field == old {
                    leaf.field = new.to_owned();
                }
                Self::Leaf(leaf)
            }
            Self::Group(group) => Self::Group(Group {
                kind: group.kind,
                negate: group.negate,
                children: group
                    .children
                    .iter()
                    .map(|c| c.rename_variable(old, new))
                    .collect(),
            }),
        }
    }
}

/// See [`Formula::contains_variable`].
pub fn contains_variable(node: &Formula, name: &str) -> bool {
    node.contains_variable(name)
}

/// See [`Formula::collect_variables`].
pub fn collect_variables(node: &Formula) -> Vec<String> {
    node.collect_variables()
}

/// See [`Formula::rename_variable`].
pub fn rename_variable(node: &Formula, old: &str, new: &str) -> Formula {
    node.rename_variable(old, new)
}

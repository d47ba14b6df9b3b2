//! Shared fixtures for the unit tests of this crate.

use ontask_core::{Column, Row, Value, ValueType};
use ontask_storage::SqliteStore;

use crate::model::{Action, Workflow};

/// Workflow 1 with columns `email` (key), `first name` and `age`, holding
/// `action` as its only action.
pub(crate) fn workflow(action: Action) -> Workflow {
    let mut wf = Workflow::new(
        1,
        "people",
        vec![
            Column::new("email", ValueType::String).key(),
            Column::new("first name", ValueType::String),
            Column::new("age", ValueType::Integer),
        ],
    );
    wf.actions.push(action);
    wf
}

/// In-memory store with three rows for the table of `wf`.
pub(crate) fn seeded_store(wf: &Workflow) -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();
    store.create_table(wf.id, &wf.columns).unwrap();
    let people = [
        ("ada@example.org", "Ada", 36),
        ("grace@example.org", "Grace", 85),
        ("linus@example.org", "Linus", 28),
    ];
    let rows: Vec<Row> = people
        .iter()
        .map(|(email, name, age)| {
            Row::new(vec![
                Value::from(*email),
                Value::from(*name),
                Value::Integer(*age),
            ])
        })
        .collect();
    store.insert_rows(wf.id, &rows).unwrap();
    store
}

//! SQLite-backed storage implementation.

mod queries;
mod store;
mod tables;
mod values;

pub use store::SqliteStore;
pub use tables::table_name;

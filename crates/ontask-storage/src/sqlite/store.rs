//! [`SqliteStore`] -- SQLite-backed tabular store.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Result, StorageError};

/// SQLite-backed implementation of the [`TabularStore`](crate::traits::TabularStore) trait.
///
/// Each workflow's data lives in its own table (see
/// [`table_name`](crate::sqlite::table_name)). The connection is wrapped in a
/// `Mutex`; all public methods acquire the lock, execute SQL, and release it.
pub struct SqliteStore {
    pub(crate) conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) a SQLite database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(?path, "opening SQLite database");

        let conn = Connection::open(path).map_err(|e| {
            StorageError::Connection(format!("failed to open {}: {e}", path.display()))
        })?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.configure_connection()?;
        Ok(store)
    }

    /// Opens an in-memory SQLite database (useful for tests and previews).
    pub fn open_in_memory() -> Result<Self> {
        debug!("opening in-memory SQLite database");
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("failed to open in-memory db: {e}")))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.configure_connection()?;
        Ok(store)
    }

    /// Sets connection pragmas.
    ///
    /// `case_sensitive_like` makes `LIKE` filters agree with the in-memory
    /// evaluation of `begins_with`, `contains` and `ends_with`.
    fn configure_connection(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA case_sensitive_like = ON;",
        )
        .map_err(|e| StorageError::Connection(format!("failed to set pragmas: {e}")))?;
        Ok(())
    }

    /// Acquires the connection lock. Helper used by all operation modules.
    pub(crate) fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Connection(format!("mutex poisoned: {e}")))
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.lock_conn().unwrap();
        let like: i64 = conn
            .query_row("SELECT 'abc' LIKE 'ABC'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(like, 0, "LIKE must be case-sensitive");
    }

    #[test]
    fn open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.db");
        SqliteStore::open(&path).unwrap();
        assert!(path.exists());
    }
}

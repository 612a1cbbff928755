// src/db/mod.rs

//! Database layer for devboot
//!
//! State lives in a single SQLite file: which apps were installed, a small
//! key/value store, and the applied migration versions. Tables are created by
//! the file-based migrator in [`migrations`]; the SQL for the initial tables
//! ships with the binary and is seeded by [`schema::seed_migrations`].

pub mod migrations;
pub mod models;
pub mod repository;
pub mod schema;

use crate::error::{Error, Result};
use rusqlite::{Connection, Transaction};
use std::path::Path;
use tracing::debug;

pub use migrations::{MigrationReport, MigrationRepository, Migrator, SqliteMigrationRepository};
pub use repository::{AppRepository, MemoryAppRepository, SqliteAppRepository};

/// Open (or create) the database at `db_path`
///
/// The parent directory is created when missing.
pub fn open(db_path: impl AsRef<Path>) -> Result<Connection> {
    let db_path = db_path.as_ref();

    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| Error::path(parent, e))?;
    }

    debug!("Opening database at {}", db_path.display());
    let conn = Connection::open(db_path)?;
    configure(&conn)?;
    Ok(conn)
}

/// Open a private in-memory database
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(())
}

/// Run `f` inside a transaction, committing on success
pub fn transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&Transaction) -> Result<T>,
{
    let tx = conn.transaction()?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_parent_dir() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("state/devboot.db");

        let conn = open(&db_path).unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER)").unwrap();

        assert!(db_path.exists());
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let mut conn = open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER)").unwrap();

        let result: Result<()> = transaction(&mut conn, |tx| {
            tx.execute("INSERT INTO t (x) VALUES (1)", [])?;
            Err(Error::ConfigError("boom".to_string()))
        });
        assert!(result.is_err());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}

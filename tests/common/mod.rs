// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use devboot::db::schema::seed_migrations;
use devboot::db::{self, Migrator, SqliteMigrationRepository};
use devboot::{Catalog, CommandOutput, OsFileSystem, ScriptedRunner};
use rusqlite::Connection;
use std::path::PathBuf;
use tempfile::TempDir;

/// dpkg-query output for a package that is not installed
pub const DPKG_MISSING: &str = "dpkg-query: no packages found matching";

/// A devboot home in a temp dir with the bundled migrations applied.
///
/// Returns (TempDir, home, connection) - keep the TempDir alive to prevent cleanup.
pub fn setup_home() -> (TempDir, PathBuf, Connection) {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path().join("devboot");
    let fs = OsFileSystem::new();

    let migrations = home.join("migrations");
    seed_migrations(&fs, &migrations).unwrap();

    let conn = db::open(home.join("devboot.db")).unwrap();
    Migrator::new(&fs, &migrations)
        .run(&SqliteMigrationRepository::new(&conn))
        .unwrap();

    (temp_dir, home, conn)
}

/// Parse a catalog from TOML, panicking on invalid input
pub fn catalog(toml: &str) -> Catalog {
    Catalog::from_toml_str(toml).unwrap()
}

/// A runner where every dpkg query reports the package as missing
pub fn apt_runner() -> ScriptedRunner {
    ScriptedRunner::new().on("dpkg-query", CommandOutput::exit(1, DPKG_MISSING))
}

/// Whether `table` exists in the database
pub fn table_exists(conn: &Connection, table: &str) -> bool {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |row| row.get::<_, i64>(0),
    )
    .unwrap()
        > 0
}

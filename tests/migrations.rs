// tests/migrations.rs

//! Schema migrator against real SQLite databases.

mod common;

use common::table_exists;
use devboot::db::models::SchemaMigration;
use devboot::db::schema::SCHEMA_MIGRATIONS_DDL;
use devboot::db::{self, MigrationRepository, Migrator, SqliteMigrationRepository};
use devboot::{Error, MemoryFileSystem, OsFileSystem};
use std::path::Path;

#[test]
fn test_bundled_migrations_are_idempotent() {
    let (_temp, home, conn) = common::setup_home();
    let fs = OsFileSystem::new();
    let repo = SqliteMigrationRepository::new(&conn);
    let migrator = Migrator::new(&fs, home.join("migrations"));

    assert_eq!(repo.version().unwrap(), 2);
    assert!(table_exists(&conn, "system_data"));
    assert!(table_exists(&conn, "installed_apps"));

    let second = migrator.run(&repo).unwrap();
    assert!(second.is_noop());
    assert_eq!(second.from_version, 2);
    assert_eq!(SchemaMigration::list_all(&conn).unwrap().len(), 2);
}

#[test]
fn test_only_newer_versions_are_applied() {
    let conn = db::open_in_memory().unwrap();
    let repo = SqliteMigrationRepository::new(&conn);
    let fs = MemoryFileSystem::new()
        .with_file("/m/2_old_up.sql", "THIS IS NOT SQL")
        .with_file("/m/3_current_up.sql", "THIS IS NOT SQL EITHER")
        .with_file("/m/4_tools_up.sql", "CREATE TABLE tools (name TEXT);")
        .with_file("/m/5_more_up.sql", "CREATE TABLE more (name TEXT);")
        .with_file("/m/5_more_down.sql", "DROP TABLE more;");

    let migrator = Migrator::new(&fs, "/m");
    repo.apply_migration(SCHEMA_MIGRATIONS_DDL).unwrap();
    repo.set_version(3).unwrap();

    let report = migrator.run(&repo).unwrap();

    assert_eq!(report.from_version, 3);
    assert_eq!(report.applied, vec![4, 5]);
    assert_eq!(repo.version().unwrap(), 5);
    assert!(table_exists(&conn, "tools"));
    assert!(table_exists(&conn, "more"));
}

#[test]
fn test_numeric_order_not_lexicographic() {
    let conn = db::open_in_memory().unwrap();
    let repo = SqliteMigrationRepository::new(&conn);
    let fs = MemoryFileSystem::new()
        .with_file("/m/10_index_up.sql", "CREATE INDEX idx_base_name ON base(name);")
        .with_file("/m/2_base_up.sql", "CREATE TABLE base (name TEXT);");

    let report = Migrator::new(&fs, "/m").run(&repo).unwrap();

    assert_eq!(report.applied, vec![2, 10]);
    assert_eq!(repo.version().unwrap(), 10);
}

#[test]
fn test_non_numeric_prefix_applies_nothing() {
    let conn = db::open_in_memory().unwrap();
    let repo = SqliteMigrationRepository::new(&conn);
    let fs = MemoryFileSystem::new()
        .with_file("/m/1_first_up.sql", "CREATE TABLE first (id INTEGER);")
        .with_file("/m/abc_broken_up.sql", "CREATE TABLE broken (id INTEGER);")
        .with_file("/m/3_third_up.sql", "CREATE TABLE third (id INTEGER);");

    let err = Migrator::new(&fs, "/m").run(&repo).unwrap_err();

    assert!(matches!(err, Error::MigrationError(_)));
    assert!(err.to_string().contains("abc_broken_up.sql"));
    assert_eq!(repo.version().unwrap(), 0);
    assert!(!table_exists(&conn, "first"));
    assert!(!table_exists(&conn, "third"));
}

#[test]
fn test_failed_file_keeps_earlier_versions() {
    let conn = db::open_in_memory().unwrap();
    let repo = SqliteMigrationRepository::new(&conn);
    let fs = MemoryFileSystem::new()
        .with_file("/m/1_ok_up.sql", "CREATE TABLE ok (id INTEGER);")
        .with_file("/m/2_bad_up.sql", "CREATE TABLE ok (id INTEGER);")
        .with_file("/m/3_never_up.sql", "CREATE TABLE never (id INTEGER);");

    let err = Migrator::new(&fs, "/m").run(&repo).unwrap_err();

    assert!(err.to_string().contains("2_bad_up.sql"));
    assert_eq!(repo.version().unwrap(), 1);
    assert!(table_exists(&conn, "ok"));
    assert!(!table_exists(&conn, "never"));
}

#[test]
fn test_missing_directory_is_reported() {
    let conn = db::open_in_memory().unwrap();
    let repo = SqliteMigrationRepository::new(&conn);
    let fs = OsFileSystem::new();
    let temp = tempfile::tempdir().unwrap();
    let missing = temp.path().join("nope");

    let err = Migrator::new(&fs, &missing).run(&repo).unwrap_err();
    assert!(err.to_string().contains("nope"));
    assert!(!Path::new(&missing).exists());
}

#[test]
fn test_dry_run_listing_leaves_new_database_untouched() {
    let temp = tempfile::tempdir().unwrap();
    let db_path = temp.path().join("devboot.db");
    let conn = db::open(&db_path).unwrap();
    let repo = SqliteMigrationRepository::new(&conn);
    let fs = MemoryFileSystem::new()
        .with_file("/m/1_first_up.sql", "CREATE TABLE first (id INTEGER);")
        .with_file("/m/2_second_up.sql", "CREATE TABLE second (id INTEGER);");

    let pending = Migrator::new(&fs, "/m").pending(&repo).unwrap();

    assert_eq!(pending.iter().map(|m| m.version).collect::<Vec<_>>(), vec![1, 2]);
    assert!(!table_exists(&conn, "schema_migrations"));
    assert!(!table_exists(&conn, "first"));
}

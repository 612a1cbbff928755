// src/db/migrations.rs
//! File-based schema migrations
//!
//! Migrations are plain SQL files named `<N>_<description>_up.sql`. The
//! migrator applies every file whose version is above the highest version
//! recorded in `schema_migrations`, one at a time, and records each version
//! right after its SQL succeeds. The first failure aborts the run; files
//! applied before it stay applied.
//!
//! Files are ordered by their numeric version, so `10_x_up.sql` runs after
//! `2_y_up.sql`. Every file name is validated before anything is applied.

use super::schema::SCHEMA_MIGRATIONS_DDL;
use crate::error::{Error, Result};
use crate::filesystem::FileSystem;
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// Suffix selecting forward migrations
pub const UP_SUFFIX: &str = "_up.sql";

/// Storage the migrator writes through
pub trait MigrationRepository {
    /// Execute a migration's SQL
    fn apply_migration(&self, sql: &str) -> Result<()>;

    /// Highest applied version, 0 when nothing has been applied
    ///
    /// Must not write: it backs `migrate --dry-run`.
    fn version(&self) -> Result<i64>;

    /// Record that `version` has been applied
    fn set_version(&self, version: i64) -> Result<()>;
}

/// [`MigrationRepository`] over a SQLite connection
pub struct SqliteMigrationRepository<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteMigrationRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl MigrationRepository for SqliteMigrationRepository<'_> {
    fn apply_migration(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn version(&self) -> Result<i64> {
        let tracked: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_migrations')",
            [],
            |row| row.get(0),
        )?;
        if !tracked {
            return Ok(0);
        }
        let version: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )?;
        Ok(version)
    }

    fn set_version(&self, version: i64) -> Result<()> {
        self.conn.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            [version],
        )?;
        Ok(())
    }
}

/// A forward migration found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    pub version: i64,
    pub name: String,
    pub path: PathBuf,
}

/// Outcome of a migration run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: i64,
    pub to_version: i64,
    pub applied: Vec<i64>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Parse the leading `_`-delimited version of a migration file name
pub fn parse_version(file_name: &str) -> Result<i64> {
    let prefix = file_name.split('_').next().unwrap_or_default();
    prefix.parse::<i64>().map_err(|_| {
        Error::MigrationError(format!(
            "Invalid migration file name '{}': expected a numeric version prefix, found '{}'",
            file_name, prefix
        ))
    })
}

/// Applies `*_up.sql` files from a directory
pub struct Migrator<'a> {
    fs: &'a dyn FileSystem,
    dir: PathBuf,
}

impl<'a> Migrator<'a> {
    pub fn new(fs: &'a dyn FileSystem, dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            dir: dir.into(),
        }
    }

    /// All forward migrations in the directory, ordered by version
    pub fn discover(&self) -> Result<Vec<MigrationFile>> {
        let mut files = Vec::new();
        for name in self.fs.read_dir(&self.dir)? {
            if !name.ends_with(UP_SUFFIX) {
                continue;
            }
            let version = parse_version(&name)?;
            files.push(MigrationFile {
                version,
                path: self.dir.join(&name),
                name,
            });
        }

        files.sort_by(|a, b| a.version.cmp(&b.version).then_with(|| a.name.cmp(&b.name)));

        let mut seen: HashMap<i64, &str> = HashMap::new();
        for file in &files {
            if let Some(previous) = seen.insert(file.version, &file.name) {
                return Err(Error::MigrationError(format!(
                    "Duplicate migration version {}: '{}' and '{}'",
                    file.version, previous, file.name
                )));
            }
        }

        Ok(files)
    }

    /// Migrations above the repository's current version, without applying anything
    pub fn pending(&self, repo: &dyn MigrationRepository) -> Result<Vec<MigrationFile>> {
        let current = repo.version()?;
        Ok(self
            .discover()?
            .into_iter()
            .filter(|m| m.version > current)
            .collect())
    }

    /// Apply every pending migration in order
    pub fn run(&self, repo: &dyn MigrationRepository) -> Result<MigrationReport> {
        repo.apply_migration(SCHEMA_MIGRATIONS_DDL)?;
        let from_version = repo.version()?;
        info!("Current schema version: {}", from_version);

        let files = self.discover()?;
        let mut applied = Vec::new();
        let mut to_version = from_version;

        for file in files.into_iter().filter(|m| m.version > from_version) {
            debug!("Reading migration {}", file.path.display());
            let sql = self.fs.read_to_string(&file.path)?;

            info!("Applying migration {} ({})", file.version, file.name);
            repo.apply_migration(&sql).map_err(|e| {
                Error::MigrationError(format!("Migration '{}' failed: {}", file.name, e))
            })?;
            repo.set_version(file.version)?;

            applied.push(file.version);
            to_version = file.version;
        }

        if applied.is_empty() {
            info!("Schema is up to date");
        } else {
            info!(
                "Schema migration complete. Now at version {}",
                to_version
            );
        }

        Ok(MigrationReport {
            from_version,
            to_version,
            applied,
        })
    }
}

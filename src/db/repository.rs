// src/db/repository.rs

//! Persistence of installed app names
//!
//! Installers only need to record and query names, so they talk to an
//! [`AppRepository`] rather than a connection. Both implementations reject
//! a name that is already recorded.

use super::models::InstalledApp;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::collections::BTreeSet;

/// Records which apps have been installed
pub trait AppRepository {
    /// Record `name`; errors if it is already recorded
    fn add_app(&self, name: &str) -> Result<()>;

    /// Whether `name` has been recorded
    fn is_recorded(&self, name: &str) -> Result<bool>;

    /// All recorded names, sorted
    fn app_names(&self) -> Result<Vec<String>>;

    /// Forget `name`, returning whether it was recorded
    fn remove_app(&self, name: &str) -> Result<bool>;
}

/// [`AppRepository`] backed by the `installed_apps` table
pub struct SqliteAppRepository<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteAppRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl AppRepository for SqliteAppRepository<'_> {
    fn add_app(&self, name: &str) -> Result<()> {
        InstalledApp::new(name).insert(self.conn)?;
        Ok(())
    }

    fn is_recorded(&self, name: &str) -> Result<bool> {
        InstalledApp::exists(self.conn, name)
    }

    fn app_names(&self) -> Result<Vec<String>> {
        Ok(InstalledApp::list_all(self.conn)?
            .into_iter()
            .map(|app| app.app_name)
            .collect())
    }

    fn remove_app(&self, name: &str) -> Result<bool> {
        InstalledApp::delete_by_name(self.conn, name)
    }
}

/// [`AppRepository`] kept in memory, for dry runs and tests
#[derive(Debug, Default)]
pub struct MemoryAppRepository {
    names: Mutex<BTreeSet<String>>,
}

impl MemoryAppRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_apps<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: Mutex::new(names.into_iter().map(Into::into).collect()),
        }
    }
}

impl AppRepository for MemoryAppRepository {
    fn add_app(&self, name: &str) -> Result<()> {
        if !self.names.lock().insert(name.to_string()) {
            return Err(Error::ConfigError(format!("App '{}' is already recorded", name)));
        }
        Ok(())
    }

    fn is_recorded(&self, name: &str) -> Result<bool> {
        Ok(self.names.lock().contains(name))
    }

    fn app_names(&self) -> Result<Vec<String>> {
        Ok(self.names.lock().iter().cloned().collect())
    }

    fn remove_app(&self, name: &str) -> Result<bool> {
        Ok(self.names.lock().remove(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::{Migrator, SqliteMigrationRepository};
    use crate::db::open_in_memory;
    use crate::db::schema::seed_migrations;
    use crate::filesystem::MemoryFileSystem;
    use std::path::Path;

    fn migrated_conn() -> Connection {
        let fs = MemoryFileSystem::new();
        seed_migrations(&fs, Path::new("/m")).unwrap();
        let conn = open_in_memory().unwrap();
        Migrator::new(&fs, "/m")
            .run(&SqliteMigrationRepository::new(&conn))
            .unwrap();
        conn
    }

    fn exercise(repo: &dyn AppRepository) {
        assert!(!repo.is_recorded("ripgrep").unwrap());
        repo.add_app("ripgrep").unwrap();
        repo.add_app("bat").unwrap();
        assert!(repo.is_recorded("ripgrep").unwrap());
        assert!(repo.add_app("ripgrep").is_err());
        assert_eq!(repo.app_names().unwrap(), vec!["bat", "ripgrep"]);
        assert!(repo.remove_app("bat").unwrap());
        assert!(!repo.remove_app("bat").unwrap());
    }

    #[test]
    fn test_sqlite_repository() {
        let conn = migrated_conn();
        exercise(&SqliteAppRepository::new(&conn));
    }

    #[test]
    fn test_memory_repository() {
        exercise(&MemoryAppRepository::new());
    }

    #[test]
    fn test_memory_repository_seeded() {
        let repo = MemoryAppRepository::with_apps(["git"]);
        assert!(repo.is_recorded("git").unwrap());
    }
}

// src/db/models/installed_app.rs

//! Installed application records

use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;

/// An app that devboot installed (or found present) on this machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledApp {
    pub id: Option<i64>,
    pub app_name: String,
    pub installed_at: Option<String>,
}

impl InstalledApp {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            id: None,
            app_name: app_name.into(),
            installed_at: None,
        }
    }

    /// Insert this record; fails if the name is already recorded
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        let installed_at = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO installed_apps (app_name, installed_at) VALUES (?1, ?2)",
            params![&self.app_name, &installed_at],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        self.installed_at = Some(installed_at);
        Ok(id)
    }

    pub fn find_by_name(conn: &Connection, app_name: &str) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, app_name, installed_at FROM installed_apps WHERE app_name = ?1",
        )?;
        let app = stmt.query_row([app_name], Self::from_row).optional()?;
        Ok(app)
    }

    pub fn exists(conn: &Connection, app_name: &str) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM installed_apps WHERE app_name = ?1",
            [app_name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// All records, alphabetically
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, app_name, installed_at FROM installed_apps ORDER BY app_name",
        )?;
        let apps = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(apps)
    }

    pub fn count(conn: &Connection) -> Result<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM installed_apps", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete by name, returning whether a row was removed
    pub fn delete_by_name(conn: &Connection, app_name: &str) -> Result<bool> {
        let rows = conn.execute("DELETE FROM installed_apps WHERE app_name = ?1", [app_name])?;
        Ok(rows > 0)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            app_name: row.get(1)?,
            installed_at: row.get(2)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::db::schema::BUNDLED_MIGRATIONS;

    fn create_test_db() -> Connection {
        let conn = open_in_memory().unwrap();
        for (name, sql) in BUNDLED_MIGRATIONS {
            if name.ends_with("_up.sql") {
                conn.execute_batch(sql).unwrap();
            }
        }
        conn
    }

    #[test]
    fn test_insert_and_find() {
        let conn = create_test_db();

        let mut app = InstalledApp::new("neovim");
        let id = app.insert(&conn).unwrap();

        let found = InstalledApp::find_by_name(&conn, "neovim").unwrap().unwrap();
        assert_eq!(found.id, Some(id));
        assert!(found.installed_at.is_some());
        assert!(InstalledApp::exists(&conn, "neovim").unwrap());
        assert!(InstalledApp::find_by_name(&conn, "emacs").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let conn = create_test_db();

        InstalledApp::new("git").insert(&conn).unwrap();
        assert!(InstalledApp::new("git").insert(&conn).is_err());
        assert_eq!(InstalledApp::count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_list_and_delete() {
        let conn = create_test_db();
        InstalledApp::new("zsh").insert(&conn).unwrap();
        InstalledApp::new("curl").insert(&conn).unwrap();

        let names: Vec<_> = InstalledApp::list_all(&conn)
            .unwrap()
            .into_iter()
            .map(|a| a.app_name)
            .collect();
        assert_eq!(names, vec!["curl", "zsh"]);

        assert!(InstalledApp::delete_by_name(&conn, "zsh").unwrap());
        assert!(!InstalledApp::delete_by_name(&conn, "zsh").unwrap());
        assert_eq!(InstalledApp::count(&conn).unwrap(), 1);
    }
}

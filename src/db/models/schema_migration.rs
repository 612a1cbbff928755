// src/db/models/schema_migration.rs

//! Applied migration history

use crate::error::Result;
use rusqlite::{Connection, Row};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMigration {
    pub version: i64,
    pub applied_at: String,
}

impl SchemaMigration {
    /// Every applied version, oldest first
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT version, applied_at FROM schema_migrations ORDER BY version")?;
        let rows = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            version: row.get(0)?,
            applied_at: row.get(1)?,
        })
    }
}

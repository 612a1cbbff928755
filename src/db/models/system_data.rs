// src/db/models/system_data.rs

//! Key/value store for run metadata

use crate::db;
use crate::error::Result;
use crate::steps::RunSummary;
use rusqlite::{Connection, OptionalExtension, Row, params};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemData {
    pub key: String,
    pub value: String,
    pub updated_at: String,
}

impl SystemData {
    /// Key recording when the last install run finished
    pub const LAST_RUN_AT: &'static str = "last_run_at";
    /// Key recording the outcome counts of the last install run
    pub const LAST_RUN_SUMMARY: &'static str = "last_run_summary";

    /// Insert or replace the value for `key`
    pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO system_data (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn get_value(conn: &Connection, key: &str) -> Result<Option<String>> {
        let mut stmt =
            conn.prepare("SELECT key, value, updated_at FROM system_data WHERE key = ?1")?;
        let entry = stmt.query_row([key], Self::from_row).optional()?;
        Ok(entry.map(|entry| entry.value))
    }

    /// Store the finish time and summary of an install run
    ///
    /// Both keys are written in one transaction so they always describe the
    /// same run.
    pub fn record_run(conn: &mut Connection, summary: &RunSummary) -> Result<()> {
        let finished_at = chrono::Utc::now().to_rfc3339();
        db::transaction(conn, |tx| {
            Self::set(tx, Self::LAST_RUN_AT, &finished_at)?;
            Self::set(tx, Self::LAST_RUN_SUMMARY, &summary.to_string())
        })
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get(0)?,
            value: row.get(1)?,
            updated_at: row.get(2)?,
        })
    }
}

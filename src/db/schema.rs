// src/db/schema.rs

//! Bundled schema definitions
//!
//! The SQL files under `migrations/` are compiled into the binary so that
//! `devboot init` can lay them down in the user's migrations directory.
//! User-supplied migrations with higher versions can sit next to them.

use crate::error::Result;
use crate::filesystem::FileSystem;
use std::path::Path;
use tracing::{debug, info};

/// Table tracking applied migration versions
pub const SCHEMA_MIGRATIONS_DDL: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

/// Migration files shipped with devboot, as (file name, SQL)
pub const BUNDLED_MIGRATIONS: &[(&str, &str)] = &[
    (
        "1_create_system_data_up.sql",
        include_str!("../../migrations/1_create_system_data_up.sql"),
    ),
    (
        "1_create_system_data_down.sql",
        include_str!("../../migrations/1_create_system_data_down.sql"),
    ),
    (
        "2_create_installed_apps_up.sql",
        include_str!("../../migrations/2_create_installed_apps_up.sql"),
    ),
    (
        "2_create_installed_apps_down.sql",
        include_str!("../../migrations/2_create_installed_apps_down.sql"),
    ),
];

/// Write the bundled migration files into `dir`
///
/// Existing files are left untouched so local edits survive a re-init.
/// Returns the names of the files that were written.
pub fn seed_migrations(fs: &dyn FileSystem, dir: &Path) -> Result<Vec<String>> {
    fs.create_dir_all(dir)?;

    let mut written = Vec::new();
    for (name, sql) in BUNDLED_MIGRATIONS {
        let path = dir.join(name);
        if fs.exists(&path) {
            debug!("Keeping existing migration {}", path.display());
            continue;
        }
        fs.write(&path, sql)?;
        written.push((*name).to_string());
    }

    if !written.is_empty() {
        info!("Seeded {} migration file(s) into {}", written.len(), dir.display());
    }
    Ok(written)
}

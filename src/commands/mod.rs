// src/commands/mod.rs
//! Command handlers for the devboot CLI

mod diagnose;
mod install;
pub mod progress;
mod query;
mod system;

pub use diagnose::cmd_diagnose;
pub use install::{InstallArgs, cmd_install};
pub use query::{cmd_catalog, cmd_forget, cmd_list, cmd_status};
pub use system::{cmd_completions, cmd_info, cmd_init, cmd_migrate};

use crate::cli::GlobalArgs;
use anyhow::{Context, Result};
use devboot::config::paths;
use devboot::db::{Migrator, SqliteMigrationRepository};
use devboot::{Catalog, OsFileSystem, Settings};
use rusqlite::Connection;
use tracing::debug;

/// Settings and filesystem shared by every command
pub struct Session {
    pub fs: OsFileSystem,
    pub settings: Settings,
}

impl Session {
    /// Resolve the home directory and load settings
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let fs = OsFileSystem::new();
        let home = global.home.clone().unwrap_or_else(paths::default_home);
        let settings = Settings::load(&fs, &home, global.config.as_deref())
            .with_context(|| format!("Failed to load settings for {}", home.display()))?;
        debug!("Using home {}", settings.home.display());
        Ok(Self { fs, settings })
    }

    /// Open the database and bring its schema up to date
    pub fn open_db(&self) -> Result<Connection> {
        let conn = devboot::db::open(&self.settings.db_path).with_context(|| {
            format!("Failed to open database {}", self.settings.db_path.display())
        })?;

        let migrator = Migrator::new(&self.fs, &self.settings.migrations_dir);
        migrator
            .run(&SqliteMigrationRepository::new(&conn))
            .with_context(|| {
                format!(
                    "Failed to migrate database (run 'devboot init' to seed {})",
                    self.settings.migrations_dir.display()
                )
            })?;
        Ok(conn)
    }

    pub fn load_catalog(&self) -> Result<Catalog> {
        Catalog::load(&self.fs, &self.settings.catalog_path).with_context(|| {
            format!(
                "Failed to load catalog {} (run 'devboot init' for a starter catalog)",
                self.settings.catalog_path.display()
            )
        })
    }
}

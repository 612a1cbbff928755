// src/commands/system.rs
//! Setup and housekeeping commands (init, migrate, info, completions)

use super::Session;
use crate::cli::Cli;
use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::Shell;
use devboot::db::models::{InstalledApp, SchemaMigration, SystemData};
use devboot::db::schema::seed_migrations;
use devboot::db::{MigrationRepository, Migrator, SqliteMigrationRepository};
use devboot::FileSystem;
use tracing::info;

/// Create the home directory, seed migrations and a starter catalog, then migrate
pub fn cmd_init(session: &Session) -> Result<()> {
    let settings = &session.settings;
    info!("Initializing devboot in {}", settings.home.display());

    session
        .fs
        .create_dir_all(&settings.home)
        .with_context(|| format!("Failed to create {}", settings.home.display()))?;

    let seeded = seed_migrations(&session.fs, &settings.migrations_dir)?;
    for name in &seeded {
        println!("  Added migration: {}", name);
    }

    if session.fs.exists(&settings.catalog_path) {
        println!("Keeping existing catalog {}", settings.catalog_path.display());
    } else {
        if let Some(parent) = settings.catalog_path.parent() {
            session.fs.create_dir_all(parent)?;
        }
        session
            .fs
            .write(&settings.catalog_path, devboot::config::STARTER_CATALOG)?;
        println!("Wrote starter catalog {}", settings.catalog_path.display());
    }

    let conn = session.open_db()?;
    let version = SqliteMigrationRepository::new(&conn).version()?;
    println!(
        "Database initialized at {} (schema version {})",
        settings.db_path.display(),
        version
    );
    Ok(())
}

/// Apply pending migrations, or list them with `dry_run`
pub fn cmd_migrate(session: &Session, dry_run: bool) -> Result<()> {
    let settings = &session.settings;
    let conn = devboot::db::open(&settings.db_path)
        .with_context(|| format!("Failed to open database {}", settings.db_path.display()))?;
    let repo = SqliteMigrationRepository::new(&conn);
    let migrator = Migrator::new(&session.fs, &settings.migrations_dir);

    if dry_run {
        let pending = migrator.pending(&repo)?;
        if pending.is_empty() {
            println!("Schema is up to date.");
        } else {
            println!("Pending migrations:");
            for file in &pending {
                println!("  {} {}", file.version, file.name);
            }
        }
        return Ok(());
    }

    let report = migrator
        .run(&repo)
        .with_context(|| format!("Migration from {} failed", settings.migrations_dir.display()))?;
    if report.is_noop() {
        println!("Schema is up to date (version {}).", report.to_version);
    } else {
        println!(
            "Applied {} migration(s): version {} -> {}",
            report.applied.len(),
            report.from_version,
            report.to_version
        );
    }
    Ok(())
}

/// Show paths, settings and database state
pub fn cmd_info(session: &Session) -> Result<()> {
    let settings = &session.settings;

    println!("devboot {}", env!("CARGO_PKG_VERSION"));
    println!("Home:            {}", settings.home.display());
    println!("Database:        {}", settings.db_path.display());
    println!("Migrations:      {}", settings.migrations_dir.display());
    println!("Catalog:         {}", settings.catalog_path.display());
    println!("Use sudo:        {}", settings.use_sudo);
    println!(
        "Command timeout: {}",
        settings
            .command_timeout
            .map(|t| format!("{}s", t.as_secs()))
            .unwrap_or_else(|| "none".to_string())
    );
    println!("Unknown state:   {:?}", settings.on_unknown_state);

    if !session.fs.exists(&settings.db_path) {
        println!("\nDatabase not initialized. Run 'devboot init'.");
        return Ok(());
    }

    let conn = devboot::db::open(&settings.db_path)
        .with_context(|| format!("Failed to open database {}", settings.db_path.display()))?;
    let history = SchemaMigration::list_all(&conn).context("Failed to read migration history")?;
    match history.last() {
        Some(latest) => println!(
            "\nSchema version:  {} (applied {})",
            latest.version, latest.applied_at
        ),
        None => println!("\nSchema version:  0"),
    }
    let installed = InstalledApp::count(&conn).context("Failed to count installed apps")?;
    println!("Installed apps:  {}", installed);
    if let Some(last) = SystemData::get_value(&conn, SystemData::LAST_RUN_AT)? {
        println!("Last run:        {}", last);
    }
    if let Some(summary) = SystemData::get_value(&conn, SystemData::LAST_RUN_SUMMARY)? {
        println!("Last result:     {}", summary);
    }
    Ok(())
}

/// Write completions for `shell` to stdout
pub fn cmd_completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "devboot", &mut std::io::stdout());
    Ok(())
}

// src/commands/query.rs
//! Query commands (status, list, catalog, forget)

use super::Session;
use anyhow::{Context, Result, bail};
use devboot::db::models::InstalledApp;
use devboot::db::{AppRepository, SqliteAppRepository};
use devboot::resolver::DependencyResolver;
use devboot::{EngineOptions, InstallEngine, InstallState, InstallerRegistry, SystemRunner};

/// Report the live install state of catalog apps
pub fn cmd_status(session: &Session, names: &[String]) -> Result<()> {
    let settings = &session.settings;
    let catalog = session.load_catalog()?;
    let conn = session.open_db()?;
    let repo = SqliteAppRepository::new(&conn);
    let runner = SystemRunner::with_timeout(settings.command_timeout);
    let registry = InstallerRegistry::with_defaults();
    let engine = InstallEngine::new(&catalog, &registry, &repo, &runner, EngineOptions::default());

    let names: Vec<&str> = if names.is_empty() {
        catalog.names().collect()
    } else {
        names.iter().map(String::as_str).collect()
    };

    let mut missing = 0;
    for name in names {
        let recorded = if repo.is_recorded(name)? { " [recorded]" } else { "" };
        match engine.status(name) {
            Ok(InstallState::Present) => println!("  {:<24} installed{}", name, recorded),
            Ok(InstallState::Absent) => {
                missing += 1;
                println!("  {:<24} not installed{}", name, recorded);
            }
            Ok(InstallState::Unknown(reason)) => {
                println!("  {:<24} unknown: {}{}", name, reason, recorded)
            }
            Err(e) => println!("  {:<24} error: {}", name, e),
        }
    }

    if missing > 0 {
        println!("\n{} app(s) not installed. Use 'devboot install' to install them.", missing);
    }
    Ok(())
}

/// List apps recorded in the database
pub fn cmd_list(session: &Session, json: bool) -> Result<()> {
    let conn = session.open_db()?;
    let apps = InstalledApp::list_all(&conn)?;

    if json {
        let out = serde_json::to_string_pretty(&apps).context("Failed to encode app list")?;
        println!("{}", out);
        return Ok(());
    }

    if apps.is_empty() {
        println!("No apps recorded.");
        return Ok(());
    }

    println!("Installed apps:");
    for app in &apps {
        println!(
            "  {:<24} {}",
            app.app_name,
            app.installed_at.as_deref().unwrap_or("-")
        );
    }
    println!("\nTotal: {} app(s)", apps.len());
    Ok(())
}

/// Show catalog entries with their methods and dependencies
pub fn cmd_catalog(session: &Session) -> Result<()> {
    let catalog = session.load_catalog()?;
    let registry = InstallerRegistry::with_defaults();

    if catalog.is_empty() {
        println!("Catalog {} is empty.", session.settings.catalog_path.display());
        return Ok(());
    }

    for app in catalog.apps() {
        let unsupported = if registry.contains(&app.method) { "" } else { " (unsupported method)" };
        println!("{} [{}]{}", app.name, app.method, unsupported);
        if let Some(desc) = &app.description {
            println!("    {}", desc);
        }
        if !app.dependencies.is_empty() {
            println!("    depends on: {}", app.dependencies.join(", "));
        }
    }
    println!("\nTotal: {} app(s)", catalog.len());
    Ok(())
}

/// Drop an app from the installed records
pub fn cmd_forget(session: &Session, name: &str) -> Result<()> {
    let conn = session.open_db()?;
    let repo = SqliteAppRepository::new(&conn);

    if !repo.remove_app(name)? {
        bail!("'{}' is not recorded as installed", name);
    }
    println!("Forgot {}. The app itself was not uninstalled.", name);

    if let Ok(catalog) = session.load_catalog() {
        let dependents = DependencyResolver::new(&catalog).dependents(name);
        if !dependents.is_empty() {
            println!("Note: {} depend(s) on {}.", dependents.join(", "), name);
        }
    }
    Ok(())
}

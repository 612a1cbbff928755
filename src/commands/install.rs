// src/commands/install.rs
//! Install command

use super::Session;
use super::progress::InstallProgress;
use anyhow::{Result, bail};
use devboot::db::SqliteAppRepository;
use devboot::db::models::SystemData;
use devboot::steps::{Step, run_steps};
use devboot::{EngineOptions, InstallEngine, InstallerRegistry, RecoveryAdvisor, SystemRunner};
use tracing::{info, warn};

pub struct InstallArgs {
    pub names: Vec<String>,
    pub all: bool,
    pub dry_run: bool,
    pub auto_recover: bool,
}

pub fn cmd_install(session: &Session, args: InstallArgs) -> Result<()> {
    let settings = &session.settings;
    let catalog = session.load_catalog()?;

    let names: Vec<String> = if args.all {
        catalog.names().map(str::to_string).collect()
    } else {
        args.names
    };
    if names.is_empty() {
        bail!("Nothing to install: the catalog is empty");
    }

    let mut steps: Vec<Step> = names
        .iter()
        .map(|name| Step::requested(&catalog, name))
        .collect();
    for step in steps.iter().filter(|s| s.method.is_none()) {
        warn!("'{}' is not in the catalog", step.name);
    }

    let mut conn = session.open_db()?;
    let repo = SqliteAppRepository::new(&conn);
    let runner = SystemRunner::with_timeout(settings.command_timeout);
    let registry = InstallerRegistry::with_defaults();
    let options = EngineOptions {
        use_sudo: settings.use_sudo,
        on_unknown_state: settings.on_unknown_state,
        dry_run: args.dry_run,
    };
    let engine = InstallEngine::new(&catalog, &registry, &repo, &runner, options);
    let advisor = RecoveryAdvisor::new().with_sudo(settings.use_sudo);

    info!("Installing {} app(s)", steps.len());
    let operation = if args.dry_run { "Checking" } else { "Installing" };
    let progress = InstallProgress::new(steps.len(), operation);

    let summary = run_steps(&mut steps, &progress, |step| {
        if args.auto_recover {
            engine.install_with_recovery(&step.name, &advisor)
        } else {
            engine.install(&step.name)
        }
    });

    print_results(&steps);
    print_failures(&steps, &advisor);

    if !args.dry_run
        && let Err(e) = SystemData::record_run(&mut conn, &summary)
    {
        warn!("Failed to record run summary: {}", e);
    }

    if !summary.is_success() {
        bail!("{} of {} app(s) failed to install", summary.failed, summary.total);
    }
    Ok(())
}

fn print_results(steps: &[Step]) {
    for report in steps.iter().filter_map(|s| s.report.as_ref()) {
        for app in &report.apps {
            println!("  {} ({}): {}", app.name, app.method, app.outcome);
        }
    }
}

fn print_failures(steps: &[Step], advisor: &RecoveryAdvisor) {
    for step in steps.iter().filter(|s| s.is_failed()) {
        let Some(failure) = &step.failure else {
            continue;
        };
        eprintln!("\n{} failed: {}", step.name, failure.error);
        let options = advisor.analyze(failure);
        eprintln!("Suggested recovery:");
        for option in options {
            eprintln!("  {}", option);
        }
    }
}

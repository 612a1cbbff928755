// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use commands::{InstallArgs, Session};
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    // Completions need no settings or database
    if let Commands::Completions { shell } = cli.command {
        return commands::cmd_completions(shell);
    }

    let session = Session::load(&cli.global)?;

    match cli.command {
        Commands::Init => commands::cmd_init(&session),
        Commands::Migrate { dry_run } => commands::cmd_migrate(&session, dry_run),
        Commands::Install {
            names,
            all,
            dry_run,
            auto_recover,
        } => commands::cmd_install(
            &session,
            InstallArgs {
                names,
                all,
                dry_run,
                auto_recover,
            },
        ),
        Commands::Status { names } => commands::cmd_status(&session, &names),
        Commands::List { json } => commands::cmd_list(&session, json),
        Commands::Catalog => commands::cmd_catalog(&session),
        Commands::Forget { name } => commands::cmd_forget(&session, &name),
        Commands::Diagnose {
            error,
            operation,
            command,
            execute,
        } => commands::cmd_diagnose(&session, &error, &operation, command.as_deref(), execute),
        Commands::Info => commands::cmd_info(&session),
        Commands::Completions { shell } => commands::cmd_completions(shell),
    }
}

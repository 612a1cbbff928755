// src/cli.rs
//! CLI definitions for devboot
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{ArgAction, Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "devboot")]
#[command(author = "Devboot Contributors")]
#[command(version)]
#[command(about = "Bootstrap a developer environment through the system package managers", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone, Debug)]
pub struct GlobalArgs {
    /// devboot home directory (default: $DEVBOOT_HOME or ~/.devboot)
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// Settings file (default: <home>/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the home directory, seed migrations and a starter catalog
    Init,

    /// Apply pending schema migrations
    Migrate {
        /// List pending migrations without applying them
        #[arg(long)]
        dry_run: bool,
    },

    /// Install apps from the catalog, dependencies first
    Install {
        /// App names as declared in the catalog
        #[arg(required_unless_present = "all")]
        names: Vec<String>,

        /// Install every app in the catalog
        #[arg(long, conflicts_with = "names")]
        all: bool,

        /// Check state and show what would be installed
        #[arg(long)]
        dry_run: bool,

        /// Run the top automated recovery once and retry a failed app
        #[arg(long)]
        auto_recover: bool,
    },

    /// Show whether catalog apps are installed
    Status {
        /// App names (all catalog apps when omitted)
        names: Vec<String>,
    },

    /// List apps recorded as installed
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the apps declared in the catalog
    Catalog,

    /// Remove an app from the installed records (does not uninstall it)
    Forget {
        name: String,
    },

    /// Suggest recovery options for an error message
    Diagnose {
        /// Error text to analyze
        error: String,

        /// What was being attempted
        #[arg(long, default_value = "install")]
        operation: String,

        /// Command that failed
        #[arg(long)]
        command: Option<String>,

        /// Run the highest ranked automated critical or recommended option
        #[arg(long)]
        execute: bool,
    },

    /// Show paths, settings and database state
    Info,

    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },
}

// src/lib.rs

//! devboot: developer environment bootstrap
//!
//! Installs applications, language runtimes and shell tooling by driving the
//! system's package managers as subprocesses, and records what it installed
//! in a local SQLite database.
//!
//! # Architecture
//!
//! - Catalog: apps are declared in TOML with an install method and optional
//!   dependencies
//! - Registry: each install method is an [`installers::Installer`] looked up
//!   by name; state checks are three-valued
//! - Plan first: dependencies are resolved and every method validated before
//!   any package manager runs
//! - File-based schema migrations applied in numeric version order
//! - Storage and subprocesses are injected (`FileSystem`, `CommandRunner`,
//!   `AppRepository`) so every layer runs against in-memory doubles in tests

pub mod config;
pub mod db;
pub mod engine;
mod error;
pub mod exec;
pub mod filesystem;
pub mod installers;
pub mod recovery;
pub mod resolver;
pub mod steps;

pub use config::{AppConfig, Catalog, Settings, UnknownStatePolicy};
pub use engine::{EngineOptions, InstallEngine, InstallOutcome, InstallReport};
pub use error::{Error, Result};
pub use exec::{CommandOutput, CommandRunner, CommandSpec, ScriptedRunner, SystemRunner};
pub use filesystem::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use installers::{InstallMethod, InstallState, Installer, InstallerRegistry};
pub use recovery::{FailureContext, RecoveryAdvisor, RecoveryOption, RecoveryPriority};
pub use steps::{RunSummary, Step, StepObserver, StepStatus};

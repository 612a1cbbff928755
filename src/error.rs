// src/error.rs

//! Error types for devboot
//!
//! All library operations return [`Result`]. The binary wraps these in
//! `anyhow` with additional context at the command layer.

use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while bootstrapping an environment
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Generic I/O failure without a path
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// I/O failure on a specific path
    #[error("I/O error on {path}: {source}")]
    PathError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A requested item does not exist
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Invalid settings or catalog content
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// TOML could not be parsed
    #[error("Failed to parse TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Migration file set is invalid
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// A subprocess could not be started
    #[error("Failed to run `{command}`: {source}")]
    SpawnError {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A subprocess exited unsuccessfully
    #[error("Command `{command}` failed ({}): {output}", exit_label(&.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },

    /// A subprocess exceeded the configured timeout
    #[error("Command `{command}` timed out after {seconds}s")]
    TimeoutError { command: String, seconds: u64 },

    /// No installer is registered for the requested method
    #[error("Unsupported install method: {0}")]
    UnsupportedMethod(String),

    /// A declared dependency is missing from the catalog
    #[error("Dependency '{dependency}' of '{app}' not found in catalog")]
    DependencyNotFound { app: String, dependency: String },

    /// Dependency declarations form a cycle
    #[error("Dependency cycle detected: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    /// Install state could not be determined and policy forbids guessing
    #[error("Could not determine whether '{app}' is installed: {reason}")]
    UnknownState { app: String, reason: String },

    /// A recovery option could not be executed
    #[error("Recovery error: {0}")]
    RecoveryError(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl Error {
    /// Wrap an I/O error with the path it occurred on
    pub fn path(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::PathError {
            path: path.into(),
            source,
        }
    }

    /// The command line associated with this error, if any
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::SpawnError { command, .. }
            | Self::CommandFailed { command, .. }
            | Self::TimeoutError { command, .. } => Some(command),
            _ => None,
        }
    }

    /// Whether this error stems from a bad catalog entry rather than the system
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ConfigError(_)
                | Self::UnsupportedMethod(_)
                | Self::DependencyNotFound { .. }
                | Self::DependencyCycle(_)
        )
    }
}

// src/config/mod.rs

//! Settings and app catalog
//!
//! Settings come from `<home>/config.toml`. Every field is optional:
//!
//! ```toml
//! db_path = "devboot.db"            # relative paths resolve against home
//! migrations_dir = "migrations"
//! catalog_path = "apps.toml"
//! use_sudo = true                   # defaults to true unless running as root
//! command_timeout_secs = 1800       # no timeout when omitted
//! on_unknown_state = "install"      # or "abort"
//! ```

pub mod catalog;
pub mod paths;

pub use catalog::{AppConfig, AppOptions, Catalog, STARTER_CATALOG};

use crate::error::{Error, Result};
use crate::filesystem::FileSystem;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// What to do when an installer cannot tell whether an app is present
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownStatePolicy {
    /// Warn and run the install anyway
    #[default]
    Install,
    /// Fail the step without installing
    Abort,
}

/// Raw settings file contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub db_path: Option<PathBuf>,
    pub migrations_dir: Option<PathBuf>,
    pub catalog_path: Option<PathBuf>,
    pub use_sudo: Option<bool>,
    pub command_timeout_secs: Option<u64>,
    pub on_unknown_state: Option<UnknownStatePolicy>,
}

/// Resolved settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub home: PathBuf,
    pub db_path: PathBuf,
    pub migrations_dir: PathBuf,
    pub catalog_path: PathBuf,
    pub use_sudo: bool,
    pub command_timeout: Option<Duration>,
    pub on_unknown_state: UnknownStatePolicy,
}

impl Settings {
    /// Defaults rooted at `home`
    pub fn defaults(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            db_path: paths::db_path(&home),
            migrations_dir: paths::migrations_dir(&home),
            catalog_path: paths::catalog_path(&home),
            use_sudo: !running_as_root(),
            command_timeout: None,
            on_unknown_state: UnknownStatePolicy::default(),
            home,
        }
    }

    /// Load settings for `home`
    ///
    /// Reads `config_path` when given (it must exist), otherwise
    /// `<home>/config.toml` if present.
    pub fn load(fs: &dyn FileSystem, home: &Path, config_path: Option<&Path>) -> Result<Self> {
        let mut settings = Self::defaults(home);

        let path = match config_path {
            Some(path) => {
                if !fs.exists(path) {
                    return Err(Error::NotFoundError(format!(
                        "Config file {} does not exist",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => {
                let path = paths::config_path(home);
                if !fs.exists(&path) {
                    debug!("No config file at {}, using defaults", path.display());
                    return Ok(settings);
                }
                path
            }
        };

        debug!("Loading settings from {}", path.display());
        let content = fs.read_to_string(&path)?;
        let file: SettingsFile = toml::from_str(&content).map_err(|e| {
            Error::ConfigError(format!("Invalid settings file {}: {}", path.display(), e))
        })?;
        settings.apply(file);
        Ok(settings)
    }

    fn apply(&mut self, file: SettingsFile) {
        if let Some(p) = file.db_path {
            self.db_path = paths::resolve(&self.home, &p);
        }
        if let Some(p) = file.migrations_dir {
            self.migrations_dir = paths::resolve(&self.home, &p);
        }
        if let Some(p) = file.catalog_path {
            self.catalog_path = paths::resolve(&self.home, &p);
        }
        if let Some(sudo) = file.use_sudo {
            self.use_sudo = sudo;
        }
        if let Some(secs) = file.command_timeout_secs {
            self.command_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(policy) = file.on_unknown_state {
            self.on_unknown_state = policy;
        }
    }
}

#[cfg(unix)]
fn running_as_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn running_as_root() -> bool {
    false
}

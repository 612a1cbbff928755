// src/config/paths.rs
//! Centralized path derivation for devboot directories

use std::path::{Path, PathBuf};

/// Environment variable overriding the devboot home directory
pub const HOME_ENV: &str = "DEVBOOT_HOME";

/// Directory name used under the user's home
pub const HOME_DIR_NAME: &str = ".devboot";

/// Resolve the devboot home directory
///
/// `$DEVBOOT_HOME` wins, then `~/.devboot`, then `./.devboot` when no home
/// directory can be determined.
pub fn default_home() -> PathBuf {
    std::env::var_os(HOME_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(HOME_DIR_NAME)))
        .unwrap_or_else(|| PathBuf::from(HOME_DIR_NAME))
}

/// Get the database file
pub fn db_path(home: &Path) -> PathBuf {
    home.join("devboot.db")
}

/// Get the migrations directory
pub fn migrations_dir(home: &Path) -> PathBuf {
    home.join("migrations")
}

/// Get the app catalog file
pub fn catalog_path(home: &Path) -> PathBuf {
    home.join("apps.toml")
}

/// Get the settings file
pub fn config_path(home: &Path) -> PathBuf {
    home.join("config.toml")
}

/// Resolve `path` against `home` unless it is already absolute
pub fn resolve(home: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        home.join(path)
    }
}

// src/config/catalog.rs

//! App catalog parsing
//!
//! The catalog is a TOML file with one `[[app]]` table per installable app:
//!
//! ```toml
//! [[app]]
//! name = "neovim"
//! method = "apt"
//! command = "neovim"
//! dependencies = ["curl"]
//!
//! [[app]]
//! name = "rustup"
//! method = "curl"
//! url = "https://sh.rustup.rs"
//! command = "sh -s -- -y"
//! options = { binary = "rustup" }
//! ```

use crate::error::{Error, Result};
use crate::filesystem::FileSystem;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Catalog written by `devboot init` when none exists
pub const STARTER_CATALOG: &str = include_str!("../../catalog/apps.toml");

/// Per-method knobs for a single app
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppOptions {
    /// Remote to install from (flatpak)
    pub remote: Option<String>,
    /// Binary whose presence on PATH means the app is installed (curl)
    pub binary: Option<String>,
    /// Refresh the package index before installing
    pub update_index: bool,
    /// Extra arguments appended to the install invocation
    pub extra_args: Vec<String>,
}

/// One installable app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    /// Install method, e.g. "apt" or "brew"
    pub method: String,
    /// Install command: package names plus optional `-flags`
    #[serde(default)]
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Download URL (curl, deb)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub options: AppOptions,
}

impl AppConfig {
    pub fn new(name: impl Into<String>, method: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: method.into(),
            command: command.into(),
            description: None,
            url: None,
            dependencies: Vec::new(),
            options: AppOptions::default(),
        }
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_options(mut self, options: AppOptions) -> Self {
        self.options = options;
        self
    }

    /// Package arguments from the install command, falling back to the app name
    ///
    /// These are passed to the install invocation as written, version pins
    /// included.
    pub fn packages(&self) -> Vec<&str> {
        let (_, packages) = self.split_command();
        if packages.is_empty() {
            vec![self.name.as_str()]
        } else {
            packages
        }
    }

    /// Package names to query, with version pins and extras removed
    ///
    /// `httpie==3.2` becomes `httpie`, `foo=1.2-1` becomes `foo`.
    pub fn package_names(&self) -> Vec<&str> {
        self.packages()
            .into_iter()
            .map(|spec| match spec.find(VERSION_SPEC_CHARS) {
                Some(0) | None => spec,
                Some(end) => &spec[..end],
            })
            .collect()
    }

    /// Flags from the install command, each followed by its value when it takes one
    pub fn flags(&self) -> Vec<&str> {
        let (flags, _) = self.split_command();
        flags
    }

    fn split_command(&self) -> (Vec<&str>, Vec<&str>) {
        let mut flags = Vec::new();
        let mut packages = Vec::new();
        let mut tokens = self.command.split_whitespace();
        while let Some(token) = tokens.next() {
            if !token.starts_with('-') {
                packages.push(token);
                continue;
            }
            flags.push(token);
            if FLAGS_WITH_VALUE.contains(&token)
                && let Some(value) = tokens.next()
            {
                flags.push(value);
            }
        }
        (flags, packages)
    }
}

/// Package manager flags whose value is the next token
const FLAGS_WITH_VALUE: &[&str] = &[
    "-t",
    "--target-release",
    "-X",
    "--repository",
    "--repo",
    "--enablerepo",
    "--disablerepo",
    "--channel",
    "-i",
    "--index-url",
    "--extra-index-url",
];

/// Characters starting a version pin or extras list (`==`, `>=`, `=`, `[`)
const VERSION_SPEC_CHARS: &[char] = &['=', '<', '>', '!', '~', '['];

/// The full set of apps available to install
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(rename = "app", default)]
    apps: Vec<AppConfig>,
}

impl Catalog {
    /// Build a catalog from entries, validating them
    pub fn new(apps: Vec<AppConfig>) -> Result<Self> {
        let catalog = Self { apps };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load the catalog at `path`
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        debug!("Loading app catalog from {}", path.display());
        let content = fs.read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::TomlError(inner) => {
                Error::ConfigError(format!("Invalid catalog {}: {}", path.display(), inner))
            }
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let catalog: Catalog = toml::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for app in &self.apps {
            if app.name.trim().is_empty() {
                return Err(Error::ConfigError("App entry with an empty name".to_string()));
            }
            if app.method.trim().is_empty() {
                return Err(Error::ConfigError(format!(
                    "App '{}' has no install method",
                    app.name
                )));
            }
            if !seen.insert(app.name.as_str()) {
                return Err(Error::ConfigError(format!(
                    "App '{}' is declared more than once",
                    app.name
                )));
            }
        }
        Ok(())
    }

    /// Look up an app by name
    pub fn find(&self, name: &str) -> Option<&AppConfig> {
        self.apps.iter().find(|app| app.name == name)
    }

    /// Look up an app by name, failing when absent
    pub fn get(&self, name: &str) -> Result<&AppConfig> {
        self.find(name)
            .ok_or_else(|| Error::NotFoundError(format!("App '{}' is not in the catalog", name)))
    }

    pub fn apps(&self) -> &[AppConfig] {
        &self.apps
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.apps.iter().map(|app| app.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

// src/installers/mod.rs

//! Installer registry and dispatch
//!
//! Every install method is an [`Installer`] capability object registered in
//! an [`InstallerRegistry`] under its method name. The registry is the only
//! place that maps catalog strings to behavior; adding a package manager
//! means registering another installer.
//!
//! State checks are three-valued. An installer that cannot tell whether an
//! app is present returns [`InstallState::Unknown`] and leaves the decision
//! to the caller.

mod deb;
mod package_manager;
mod script;

pub use deb::DebInstaller;
pub use package_manager::{PackageManager, PackageManagerInstaller};
pub use script::ScriptInstaller;

use crate::config::AppConfig;
use crate::db::AppRepository;
use crate::error::{Error, Result};
use crate::exec::CommandRunner;
use std::collections::BTreeMap;
use std::fmt;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use tracing::debug;

/// Built-in install methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum InstallMethod {
    Apt,
    Brew,
    Dnf,
    Zypper,
    Apk,
    Snap,
    Flatpak,
    Emerge,
    Eopkg,
    Mise,
    Pip,
    Curl,
    Deb,
}

impl InstallMethod {
    /// Whether installs through this method need root
    pub fn needs_root(&self) -> bool {
        matches!(
            self,
            Self::Apt
                | Self::Dnf
                | Self::Zypper
                | Self::Apk
                | Self::Snap
                | Self::Emerge
                | Self::Eopkg
                | Self::Deb
        )
    }
}

/// Whether an app is present on the system
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallState {
    Present,
    Absent,
    /// The check itself failed; carries the reason
    Unknown(String),
}

impl InstallState {
    /// Fold per-package states: any absent package means the app is absent
    pub fn combine(states: impl IntoIterator<Item = InstallState>) -> InstallState {
        let mut unknown = None;
        for state in states {
            match state {
                InstallState::Absent => return InstallState::Absent,
                InstallState::Unknown(reason) => {
                    unknown.get_or_insert(reason);
                }
                InstallState::Present => {}
            }
        }
        match unknown {
            Some(reason) => InstallState::Unknown(reason),
            None => InstallState::Present,
        }
    }
}

impl fmt::Display for InstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => write!(f, "installed"),
            Self::Absent => write!(f, "not installed"),
            Self::Unknown(reason) => write!(f, "unknown ({})", reason),
        }
    }
}

/// What an installer may use while checking and installing
pub struct InstallContext<'a> {
    pub runner: &'a dyn CommandRunner,
    /// Prefix root-requiring commands with sudo
    pub use_sudo: bool,
}

impl<'a> InstallContext<'a> {
    pub fn new(runner: &'a dyn CommandRunner, use_sudo: bool) -> Self {
        Self { runner, use_sudo }
    }
}

/// Capability object for one install method
pub trait Installer {
    /// Method name this installer handles, as written in the catalog
    fn method(&self) -> &str;

    /// Determine whether `app` is already installed
    fn check(&self, app: &AppConfig, ctx: &InstallContext<'_>) -> InstallState;

    /// Install `app`, failing on a non-zero exit
    fn install(&self, app: &AppConfig, ctx: &InstallContext<'_>) -> Result<()>;

    /// Record `app` as installed
    fn record(&self, app: &AppConfig, repo: &dyn AppRepository) -> Result<()> {
        if repo.is_recorded(&app.name)? {
            debug!("{} already recorded", app.name);
            return Ok(());
        }
        repo.add_app(&app.name)
    }
}

/// Maps method names to installers
#[derive(Default)]
pub struct InstallerRegistry {
    installers: BTreeMap<String, Box<dyn Installer>>,
}

impl InstallerRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in method
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for method in InstallMethod::iter() {
            let installer: Box<dyn Installer> = match PackageManager::from_method(method) {
                Some(manager) => Box::new(PackageManagerInstaller::new(manager)),
                None if method == InstallMethod::Deb => Box::new(DebInstaller::new()),
                None => Box::new(ScriptInstaller::new()),
            };
            registry.register(installer);
        }
        registry
    }

    /// Register an installer, returning the one it replaced
    pub fn register(&mut self, installer: Box<dyn Installer>) -> Option<Box<dyn Installer>> {
        self.installers.insert(installer.method().to_string(), installer)
    }

    /// Installer for `method`, by exact name
    pub fn get(&self, method: &str) -> Result<&dyn Installer> {
        self.installers
            .get(method)
            .map(|installer| installer.as_ref())
            .ok_or_else(|| Error::UnsupportedMethod(method.to_string()))
    }

    pub fn contains(&self, method: &str) -> bool {
        self.installers.contains_key(method)
    }

    /// Registered method names, sorted
    pub fn methods(&self) -> Vec<&str> {
        self.installers.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ScriptedRunner;
    use std::str::FromStr;

    struct NixInstaller;

    impl Installer for NixInstaller {
        fn method(&self) -> &str {
            "nix"
        }

        fn check(&self, _app: &AppConfig, _ctx: &InstallContext<'_>) -> InstallState {
            InstallState::Absent
        }

        fn install(&self, _app: &AppConfig, _ctx: &InstallContext<'_>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_defaults_cover_every_method() {
        let registry = InstallerRegistry::with_defaults();
        for method in InstallMethod::iter() {
            assert!(registry.contains(method.as_ref()), "missing {}", method);
        }
        assert_eq!(registry.methods().len(), 13);
    }

    #[test]
    fn test_unknown_method_is_error() {
        let registry = InstallerRegistry::with_defaults();
        let err = registry.get("pacman").err().unwrap();
        assert!(matches!(err, Error::UnsupportedMethod(ref m) if m == "pacman"));
        assert!(err.to_string().contains("pacman"));
    }

    #[test]
    fn test_lookup_is_exact() {
        let registry = InstallerRegistry::with_defaults();
        assert!(registry.get("APT").is_err());
        assert_eq!(registry.get("apt").unwrap().method(), "apt");
    }

    #[test]
    fn test_register_custom_installer() {
        let mut registry = InstallerRegistry::new();
        assert!(registry.register(Box::new(NixInstaller)).is_none());

        let runner = ScriptedRunner::new();
        let ctx = InstallContext::new(&runner, false);
        let app = AppConfig::new("hello", "nix", "hello");
        let installer = registry.get("nix").unwrap();

        assert_eq!(installer.check(&app, &ctx), InstallState::Absent);
        assert!(registry.register(Box::new(NixInstaller)).is_some());
    }

    #[test]
    fn test_method_names_round_trip() {
        assert_eq!(InstallMethod::from_str("flatpak").unwrap(), InstallMethod::Flatpak);
        assert_eq!(InstallMethod::Eopkg.to_string(), "eopkg");
        assert!(InstallMethod::Apt.needs_root());
        assert!(!InstallMethod::Brew.needs_root());
    }

    #[test]
    fn test_combine_states() {
        use InstallState::*;
        assert_eq!(InstallState::combine([Present, Present]), Present);
        assert_eq!(InstallState::combine([Present, Unknown("x".into()), Absent]), Absent);
        assert_eq!(InstallState::combine([Unknown("x".into()), Present]), Unknown("x".into()));
    }

    #[test]
    fn test_record_skips_existing() {
        let repo = crate::db::MemoryAppRepository::with_apps(["hello"]);
        let app = AppConfig::new("hello", "nix", "hello");
        NixInstaller.record(&app, &repo).unwrap();
        assert_eq!(repo.app_names().unwrap(), vec!["hello"]);
    }
}

// src/engine.rs

//! Install orchestration
//!
//! [`InstallEngine`] ties the catalog, installer registry, repository and
//! command runner together. Installing an app resolves its dependency plan,
//! checks that every app in the plan has a registered installer, and only
//! then starts running package managers.

use crate::config::{AppConfig, Catalog, UnknownStatePolicy};
use crate::db::AppRepository;
use crate::error::{Error, Result};
use crate::exec::CommandRunner;
use crate::installers::{InstallContext, InstallState, Installer, InstallerRegistry};
use crate::recovery::{FailureContext, RecoveryAdvisor};
use crate::resolver::DependencyResolver;
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// Engine behavior switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub use_sudo: bool,
    pub on_unknown_state: UnknownStatePolicy,
    /// Check state but never install or record
    pub dry_run: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            use_sudo: true,
            on_unknown_state: UnknownStatePolicy::Install,
            dry_run: false,
        }
    }
}

/// What happened to one app of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallOutcome {
    Installed,
    AlreadyPresent,
    /// Dry run: the app would have been installed
    WouldInstall,
}

impl fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installed => write!(f, "installed"),
            Self::AlreadyPresent => write!(f, "already present"),
            Self::WouldInstall => write!(f, "would install"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppOutcome {
    pub name: String,
    pub method: String,
    pub outcome: InstallOutcome,
}

/// Result of installing one app and its dependencies, in plan order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub apps: Vec<AppOutcome>,
}

impl InstallReport {
    pub fn count(&self, outcome: InstallOutcome) -> usize {
        self.apps.iter().filter(|a| a.outcome == outcome).count()
    }

    /// Outcome for `name`, if it was part of the plan
    pub fn outcome(&self, name: &str) -> Option<InstallOutcome> {
        self.apps.iter().find(|a| a.name == name).map(|a| a.outcome)
    }
}

pub struct InstallEngine<'a> {
    catalog: &'a Catalog,
    registry: &'a InstallerRegistry,
    repo: &'a dyn AppRepository,
    runner: &'a dyn CommandRunner,
    options: EngineOptions,
}

impl<'a> InstallEngine<'a> {
    pub fn new(
        catalog: &'a Catalog,
        registry: &'a InstallerRegistry,
        repo: &'a dyn AppRepository,
        runner: &'a dyn CommandRunner,
        options: EngineOptions,
    ) -> Self {
        Self {
            catalog,
            registry,
            repo,
            runner,
            options,
        }
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    fn context(&self) -> InstallContext<'a> {
        InstallContext::new(self.runner, self.options.use_sudo)
    }

    /// Resolve the plan for `name` and pair each app with its installer
    ///
    /// Runs no subprocess; any resolution or dispatch error surfaces here.
    pub fn plan(&self, name: &str) -> Result<Vec<(&'a AppConfig, &'a dyn Installer)>> {
        let registry = self.registry;
        DependencyResolver::new(self.catalog)
            .resolve(name)?
            .into_iter()
            .map(|app| registry.get(&app.method).map(|installer| (app, installer)))
            .collect()
    }

    /// Install `name` after its dependencies
    pub fn install(&self, name: &str) -> Result<InstallReport> {
        let plan = self.plan(name)?;
        let mut report = InstallReport::default();

        for (app, installer) in plan {
            let outcome = self.install_one(app, installer)?;
            report.apps.push(AppOutcome {
                name: app.name.clone(),
                method: app.method.clone(),
                outcome,
            });
        }
        Ok(report)
    }

    /// Install `name`, running the top executable recovery once on failure
    ///
    /// Only automated critical or recommended options are run. Catalog errors
    /// and dry runs are never retried. The original error is returned when no
    /// such option exists or the recovery fails.
    pub fn install_with_recovery(
        &self,
        name: &str,
        advisor: &RecoveryAdvisor,
    ) -> Result<InstallReport> {
        let err = match self.install(name) {
            Ok(report) => return Ok(report),
            Err(e) => e,
        };
        if self.options.dry_run || err.is_configuration() {
            return Err(err);
        }

        let ctx = FailureContext::from_error(format!("install {}", name), &err);
        let options = advisor.analyze(&ctx);
        let Some(option) = RecoveryAdvisor::first_executable(&options) else {
            return Err(err);
        };

        warn!("Install of {} failed, trying recovery: {}", name, option.title);
        match advisor.execute(option, self.runner) {
            Ok(result) if result.success => {
                info!("{}", result.message);
                self.install(name)
            }
            Ok(result) => {
                warn!("{}", result.message);
                Err(err)
            }
            Err(e) => {
                warn!("Recovery could not run: {}", e);
                Err(err)
            }
        }
    }

    fn install_one(&self, app: &AppConfig, installer: &dyn Installer) -> Result<InstallOutcome> {
        let ctx = self.context();

        match installer.check(app, &ctx) {
            InstallState::Present => {
                info!("{} is already installed", app.name);
                if !self.options.dry_run {
                    installer.record(app, self.repo)?;
                }
                return Ok(InstallOutcome::AlreadyPresent);
            }
            InstallState::Absent => {}
            InstallState::Unknown(reason) => match self.options.on_unknown_state {
                UnknownStatePolicy::Abort => {
                    return Err(Error::UnknownState {
                        app: app.name.clone(),
                        reason,
                    });
                }
                UnknownStatePolicy::Install => {
                    warn!(
                        "Could not determine whether {} is installed ({}), installing anyway",
                        app.name, reason
                    );
                }
            },
        }

        if self.options.dry_run {
            info!("Would install {} via {}", app.name, app.method);
            return Ok(InstallOutcome::WouldInstall);
        }

        installer.install(app, &ctx)?;
        installer.record(app, self.repo)?;
        info!("Installed {}", app.name);
        Ok(InstallOutcome::Installed)
    }

    /// Current state of `name` without installing anything
    pub fn status(&self, name: &str) -> Result<InstallState> {
        let app = self.catalog.get(name)?;
        let installer = self.registry.get(&app.method)?;
        Ok(installer.check(app, &self.context()))
    }
}

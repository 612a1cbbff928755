// src/installers/deb.rs

//! Installer for standalone `.deb` packages fetched from a URL

use super::package_manager::dpkg_check;
use super::{InstallContext, InstallMethod, InstallState, Installer};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::exec::CommandSpec;
use std::path::Path;
use tracing::{debug, info, warn};

/// Downloads a `.deb`, installs it with dpkg and lets apt fix dependencies
#[derive(Debug, Clone, Copy, Default)]
pub struct DebInstaller;

impl DebInstaller {
    pub fn new() -> Self {
        Self
    }

    /// The three commands an install runs, in order
    pub fn install_commands(
        &self,
        app: &AppConfig,
        url: &str,
        package: &Path,
        use_sudo: bool,
    ) -> [CommandSpec; 3] {
        let download = CommandSpec::new("curl")
            .args(["-fsSL", "-o"])
            .arg(package.to_string_lossy())
            .arg(url);
        let unpack = CommandSpec::new("dpkg")
            .arg("-i")
            .args(app.options.extra_args.iter().cloned())
            .arg(package.to_string_lossy())
            .privileged(use_sudo);
        let fix = CommandSpec::new("apt-get")
            .args(["install", "-f", "-y"])
            .privileged(use_sudo);
        [download, unpack, fix]
    }
}

impl Installer for DebInstaller {
    fn method(&self) -> &str {
        InstallMethod::Deb.as_ref()
    }

    fn check(&self, app: &AppConfig, ctx: &InstallContext<'_>) -> InstallState {
        dpkg_check(app, ctx.runner)
    }

    fn install(&self, app: &AppConfig, ctx: &InstallContext<'_>) -> Result<()> {
        let url = app.url.as_deref().ok_or_else(|| {
            Error::ConfigError(format!("App '{}' uses deb but has no url", app.name))
        })?;

        let workdir = tempfile::Builder::new().prefix("devboot-deb-").tempdir()?;
        let package = workdir.path().join(format!("{}.deb", app.name));
        let [download, unpack, fix] = self.install_commands(app, url, &package, ctx.use_sudo);

        info!("Downloading {} from {}", app.name, url);
        ctx.runner.run_checked(&download)?;

        // dpkg exits non-zero when dependencies are missing; apt-get -f
        // resolves them and is the step whose failure counts
        let out = ctx.runner.run(&unpack)?;
        if !out.success() {
            warn!(
                "dpkg -i {} exited with {:?}, fixing dependencies",
                app.name, out.code
            );
        }
        ctx.runner.run_checked(&fix)?;

        debug!("Removing {}", workdir.path().display());
        Ok(())
    }
}

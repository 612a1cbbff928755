// src/installers/package_manager.rs

//! Installers for package managers with a query command
//!
//! Each method pairs a read-only query (`dpkg-query`, `rpm -q`, `brew list`,
//! ...) with an install invocation. Queries never need root; installs are
//! run through sudo when the method requires it and sudo is enabled.

use super::{InstallContext, InstallMethod, InstallState, Installer};
use crate::config::AppConfig;
use crate::error::Result;
use crate::exec::{CommandOutput, CommandRunner, CommandSpec};
use tracing::{debug, info};

const DEFAULT_FLATPAK_REMOTE: &str = "flathub";

/// Install methods backed by a package manager with a query command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
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
}

impl PackageManager {
    /// `None` for `curl` and `deb`, which have their own installers
    pub fn from_method(method: InstallMethod) -> Option<Self> {
        let manager = match method {
            InstallMethod::Apt => Self::Apt,
            InstallMethod::Brew => Self::Brew,
            InstallMethod::Dnf => Self::Dnf,
            InstallMethod::Zypper => Self::Zypper,
            InstallMethod::Apk => Self::Apk,
            InstallMethod::Snap => Self::Snap,
            InstallMethod::Flatpak => Self::Flatpak,
            InstallMethod::Emerge => Self::Emerge,
            InstallMethod::Eopkg => Self::Eopkg,
            InstallMethod::Mise => Self::Mise,
            InstallMethod::Pip => Self::Pip,
            InstallMethod::Curl | InstallMethod::Deb => return None,
        };
        Some(manager)
    }

    pub fn method(self) -> InstallMethod {
        match self {
            Self::Apt => InstallMethod::Apt,
            Self::Brew => InstallMethod::Brew,
            Self::Dnf => InstallMethod::Dnf,
            Self::Zypper => InstallMethod::Zypper,
            Self::Apk => InstallMethod::Apk,
            Self::Snap => InstallMethod::Snap,
            Self::Flatpak => InstallMethod::Flatpak,
            Self::Emerge => InstallMethod::Emerge,
            Self::Eopkg => InstallMethod::Eopkg,
            Self::Mise => InstallMethod::Mise,
            Self::Pip => InstallMethod::Pip,
        }
    }
}

/// Installer for one of the query-capable package managers
#[derive(Debug, Clone, Copy)]
pub struct PackageManagerInstaller {
    manager: PackageManager,
    method: InstallMethod,
}

impl PackageManagerInstaller {
    pub fn new(manager: PackageManager) -> Self {
        Self {
            manager,
            method: manager.method(),
        }
    }

    /// Command reporting whether `package` is installed
    fn query_command(&self, package: &str) -> CommandSpec {
        match self.manager {
            PackageManager::Apt => dpkg_query(package),
            PackageManager::Brew => CommandSpec::new("brew").args(["list", "--versions", package]),
            PackageManager::Dnf | PackageManager::Zypper => {
                CommandSpec::new("rpm").args(["-q", package])
            }
            PackageManager::Apk => CommandSpec::new("apk").args(["info", "-e", package]),
            PackageManager::Snap => CommandSpec::new("snap").args(["list", package]),
            PackageManager::Flatpak => CommandSpec::new("flatpak").args(["info", package]),
            PackageManager::Emerge => CommandSpec::new("qlist").args(["-I", package]),
            PackageManager::Eopkg => CommandSpec::new("eopkg").arg("list-installed"),
            PackageManager::Mise => CommandSpec::new("mise").args(["where", package]),
            PackageManager::Pip => {
                CommandSpec::new("python3").args(["-m", "pip", "show", package])
            }
        }
    }

    /// Interpret a finished query for `package`
    fn interpret(&self, package: &str, out: &CommandOutput) -> InstallState {
        match self.manager {
            PackageManager::Apt => dpkg_state(out),
            PackageManager::Brew | PackageManager::Emerge => match out.code {
                Some(0) if !out.output.trim().is_empty() => InstallState::Present,
                Some(0) | Some(1) => InstallState::Absent,
                _ => unexpected(out),
            },
            PackageManager::Eopkg => match out.code {
                Some(0) => {
                    let listed = out
                        .output
                        .lines()
                        .filter_map(|line| line.split_whitespace().next())
                        .any(|name| name == package);
                    if listed {
                        InstallState::Present
                    } else {
                        InstallState::Absent
                    }
                }
                _ => unexpected(out),
            },
            _ => match out.code {
                Some(0) => InstallState::Present,
                Some(1) => InstallState::Absent,
                _ => unexpected(out),
            },
        }
    }

    /// Command refreshing the package index, if the manager has one
    pub fn update_command(&self, use_sudo: bool) -> Option<CommandSpec> {
        let spec = match self.manager {
            PackageManager::Apt => CommandSpec::new("apt-get").arg("update"),
            PackageManager::Brew => CommandSpec::new("brew").arg("update"),
            PackageManager::Dnf => CommandSpec::new("dnf").arg("makecache"),
            PackageManager::Zypper => {
                CommandSpec::new("zypper").args(["--non-interactive", "refresh"])
            }
            PackageManager::Apk => CommandSpec::new("apk").arg("update"),
            PackageManager::Flatpak => {
                CommandSpec::new("flatpak").args(["update", "-y", "--appstream"])
            }
            PackageManager::Emerge => CommandSpec::new("emerge").arg("--sync"),
            PackageManager::Eopkg => CommandSpec::new("eopkg").arg("update-repo"),
            PackageManager::Snap | PackageManager::Mise | PackageManager::Pip => return None,
        };
        Some(spec.privileged(use_sudo && self.method.needs_root()))
    }

    /// Install invocation for `app`
    pub fn install_command(&self, app: &AppConfig, use_sudo: bool) -> CommandSpec {
        let base = match self.manager {
            PackageManager::Apt => CommandSpec::new("apt-get").args(["install", "-y"]),
            PackageManager::Brew => CommandSpec::new("brew").arg("install"),
            PackageManager::Dnf => CommandSpec::new("dnf").args(["install", "-y"]),
            PackageManager::Zypper => {
                CommandSpec::new("zypper").args(["--non-interactive", "install"])
            }
            PackageManager::Apk => CommandSpec::new("apk").arg("add"),
            PackageManager::Snap => CommandSpec::new("snap").arg("install"),
            PackageManager::Flatpak => CommandSpec::new("flatpak")
                .args(["install", "-y", "--noninteractive"])
                .arg(app.options.remote.as_deref().unwrap_or(DEFAULT_FLATPAK_REMOTE)),
            PackageManager::Emerge => CommandSpec::new("emerge").arg("--noreplace"),
            PackageManager::Eopkg => CommandSpec::new("eopkg").args(["install", "-y"]),
            PackageManager::Mise => CommandSpec::new("mise").args(["use", "--global"]),
            PackageManager::Pip => {
                CommandSpec::new("python3").args(["-m", "pip", "install", "--user"])
            }
        };

        base.args(app.flags())
            .args(app.packages())
            .args(app.options.extra_args.iter().cloned())
            .privileged(use_sudo && self.method.needs_root())
    }
}

impl Installer for PackageManagerInstaller {
    fn method(&self) -> &str {
        self.method.as_ref()
    }

    fn check(&self, app: &AppConfig, ctx: &InstallContext<'_>) -> InstallState {
        let states = app.package_names().into_iter().map(|package| {
            let spec = self.query_command(package);
            let state = match ctx.runner.run(&spec) {
                Ok(out) => self.interpret(package, &out),
                Err(e) => InstallState::Unknown(e.to_string()),
            };
            debug!("{} package {}: {}", self.method, package, state);
            state
        });
        InstallState::combine(states.collect::<Vec<_>>())
    }

    fn install(&self, app: &AppConfig, ctx: &InstallContext<'_>) -> Result<()> {
        if app.options.update_index
            && let Some(update) = self.update_command(ctx.use_sudo)
        {
            info!("Refreshing {} package index", self.method);
            ctx.runner.run_checked(&update)?;
        }

        let spec = self.install_command(app, ctx.use_sudo);
        info!("Installing {} via {}", app.name, self.method);
        ctx.runner.run_checked(&spec)?;
        Ok(())
    }
}

/// `dpkg-query` invocation printing the package status line
pub(super) fn dpkg_query(package: &str) -> CommandSpec {
    CommandSpec::new("dpkg-query").args(["-W", "-f=${Status}", package])
}

/// Interpret `dpkg-query -W -f=${Status}` output
pub(super) fn dpkg_state(out: &CommandOutput) -> InstallState {
    match out.code {
        Some(0) if out.output.contains("install ok installed") => InstallState::Present,
        Some(0) | Some(1) => InstallState::Absent,
        _ => unexpected(out),
    }
}

/// Query every package of `app` through dpkg
pub(super) fn dpkg_check(app: &AppConfig, runner: &dyn CommandRunner) -> InstallState {
    let states: Vec<_> = app
        .package_names()
        .into_iter()
        .map(|package| match runner.run(&dpkg_query(package)) {
            Ok(out) => dpkg_state(&out),
            Err(e) => InstallState::Unknown(e.to_string()),
        })
        .collect();
    InstallState::combine(states)
}

fn unexpected(out: &CommandOutput) -> InstallState {
    let detail = out.output.lines().next().unwrap_or("").trim();
    match out.code {
        Some(code) => InstallState::Unknown(format!("query exited with {}: {}", code, detail)),
        None => InstallState::Unknown("query terminated by signal".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppOptions;
    use crate::error::Error;
    use crate::exec::ScriptedRunner;

    fn installer(method: InstallMethod) -> PackageManagerInstaller {
        PackageManagerInstaller::new(PackageManager::from_method(method).unwrap())
    }

    #[test]
    fn test_only_query_capable_methods_map_to_managers() {
        use strum::IntoEnumIterator;

        for method in InstallMethod::iter() {
            match PackageManager::from_method(method) {
                Some(manager) => assert_eq!(manager.method(), method),
                None => assert!(matches!(method, InstallMethod::Curl | InstallMethod::Deb)),
            }
        }
    }

    #[test]
    fn test_apt_present_runs_only_the_query() {
        let runner = ScriptedRunner::new().on(
            "dpkg-query -W -f=${Status} foo-pkg",
            CommandOutput::ok("install ok installed"),
        );
        let ctx = InstallContext::new(&runner, false);
        let app = AppConfig::new("foo", "apt", "foo-pkg");

        assert_eq!(installer(InstallMethod::Apt).check(&app, &ctx), InstallState::Present);
        assert_eq!(runner.calls(), vec!["dpkg-query -W -f=${Status} foo-pkg"]);
    }

    #[test]
    fn test_apt_states() {
        let runner = ScriptedRunner::new()
            .on("dpkg-query -W -f=${Status} removed", CommandOutput::ok("deinstall ok config-files"))
            .on("dpkg-query -W -f=${Status} missing", CommandOutput::exit(1, "no packages found matching missing"))
            .on("dpkg-query -W -f=${Status} locked", CommandOutput::exit(2, "dpkg-query: error: database locked"));
        let ctx = InstallContext::new(&runner, false);
        let apt = installer(InstallMethod::Apt);

        assert_eq!(apt.check(&AppConfig::new("r", "apt", "removed"), &ctx), InstallState::Absent);
        assert_eq!(apt.check(&AppConfig::new("m", "apt", "missing"), &ctx), InstallState::Absent);
        assert!(matches!(
            apt.check(&AppConfig::new("l", "apt", "locked"), &ctx),
            InstallState::Unknown(reason) if reason.contains("database locked")
        ));
    }

    #[test]
    fn test_missing_binary_is_unknown() {
        let runner = ScriptedRunner::new().fail_to_spawn("snap");
        let ctx = InstallContext::new(&runner, false);
        let app = AppConfig::new("code", "snap", "code --classic");

        let state = installer(InstallMethod::Snap).check(&app, &ctx);
        assert!(matches!(state, InstallState::Unknown(_)));
        assert_eq!(runner.calls(), vec!["snap list code"]);
    }

    #[test]
    fn test_any_absent_package_means_absent() {
        let runner = ScriptedRunner::new()
            .on("rpm -q gcc", CommandOutput::ok("gcc-14.1"))
            .on("rpm -q make", CommandOutput::exit(1, "package make is not installed"));
        let ctx = InstallContext::new(&runner, false);
        let app = AppConfig::new("build-tools", "dnf", "gcc make");

        assert_eq!(installer(InstallMethod::Dnf).check(&app, &ctx), InstallState::Absent);
    }

    #[test]
    fn test_brew_empty_listing_is_absent() {
        let runner = ScriptedRunner::new().on("brew list", CommandOutput::ok(""));
        let ctx = InstallContext::new(&runner, false);

        let state = installer(InstallMethod::Brew).check(&AppConfig::new("jq", "brew", "jq"), &ctx);
        assert_eq!(state, InstallState::Absent);
    }

    #[test]
    fn test_eopkg_listing() {
        let listing = "git - Fast version control\nzsh - Z shell\n";
        let runner = ScriptedRunner::new().on("eopkg list-installed", CommandOutput::ok(listing));
        let ctx = InstallContext::new(&runner, false);
        let eopkg = installer(InstallMethod::Eopkg);

        assert_eq!(eopkg.check(&AppConfig::new("zsh", "eopkg", "zsh"), &ctx), InstallState::Present);
        assert_eq!(eopkg.check(&AppConfig::new("fish", "eopkg", "fish"), &ctx), InstallState::Absent);
    }

    #[test]
    fn test_install_commands() {
        let app = AppConfig::new("code", "snap", "code --classic");
        assert_eq!(
            installer(InstallMethod::Snap).install_command(&app, true).to_string(),
            "sudo snap install --classic code"
        );

        let app = AppConfig::new("gimp", "flatpak", "org.gimp.GIMP");
        assert_eq!(
            installer(InstallMethod::Flatpak).install_command(&app, true).to_string(),
            "flatpak install -y --noninteractive flathub org.gimp.GIMP"
        );

        let app = AppConfig::new("node", "mise", "node@lts");
        assert_eq!(
            installer(InstallMethod::Mise).install_command(&app, true).to_string(),
            "mise use --global node@lts"
        );

        let app = AppConfig::new("httpie", "pip", "httpie").with_options(AppOptions {
            extra_args: vec!["--upgrade".to_string()],
            ..Default::default()
        });
        assert_eq!(
            installer(InstallMethod::Pip).install_command(&app, true).to_string(),
            "python3 -m pip install --user httpie --upgrade"
        );

        let app = AppConfig::new("tools", "zypper", "git vim");
        assert_eq!(
            installer(InstallMethod::Zypper).install_command(&app, false).to_string(),
            "zypper --non-interactive install git vim"
        );
    }

    #[test]
    fn test_pinned_pip_package_is_queried_by_name() {
        let runner = ScriptedRunner::new().on(
            "python3 -m pip show httpie",
            CommandOutput::exit(1, "WARNING: Package(s) not found: httpie"),
        );
        let ctx = InstallContext::new(&runner, false);
        let app = AppConfig::new("httpie", "pip", "httpie==3.2");
        let pip = installer(InstallMethod::Pip);

        assert_eq!(pip.check(&app, &ctx), InstallState::Absent);
        assert_eq!(runner.calls(), vec!["python3 -m pip show httpie"]);
        assert_eq!(
            pip.install_command(&app, false).to_string(),
            "python3 -m pip install --user httpie==3.2"
        );
    }

    #[test]
    fn test_apt_target_release_is_not_a_package() {
        let runner = apt_missing();
        let ctx = InstallContext::new(&runner, false);
        let app = AppConfig::new("neovim", "apt", "-t bookworm-backports neovim");
        let apt = installer(InstallMethod::Apt);

        assert_eq!(apt.check(&app, &ctx), InstallState::Absent);
        assert_eq!(runner.calls(), vec!["dpkg-query -W -f=${Status} neovim"]);
        assert_eq!(
            apt.install_command(&app, false).to_string(),
            "apt-get install -y -t bookworm-backports neovim"
        );
    }

    fn apt_missing() -> ScriptedRunner {
        ScriptedRunner::new().on("dpkg-query", CommandOutput::exit(1, "no packages found matching"))
    }

    #[test]
    fn test_install_refreshes_index_first() {
        let runner = ScriptedRunner::new();
        let ctx = InstallContext::new(&runner, true);
        let app = AppConfig::new("ripgrep", "apt", "ripgrep").with_options(AppOptions {
            update_index: true,
            ..Default::default()
        });

        installer(InstallMethod::Apt).install(&app, &ctx).unwrap();

        assert_eq!(
            runner.calls(),
            vec!["sudo apt-get update", "sudo apt-get install -y ripgrep"]
        );
    }

    #[test]
    fn test_install_failure_carries_output() {
        let runner = ScriptedRunner::new().on(
            "apk add",
            CommandOutput::exit(1, "ERROR: unable to select packages:\n  nope (no such package)"),
        );
        let ctx = InstallContext::new(&runner, false);
        let app = AppConfig::new("nope", "apk", "nope");

        let err = installer(InstallMethod::Apk).install(&app, &ctx).unwrap_err();
        match err {
            Error::CommandFailed { command, code, output } => {
                assert_eq!(command, "apk add nope");
                assert_eq!(code, Some(1));
                assert!(output.contains("no such package"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

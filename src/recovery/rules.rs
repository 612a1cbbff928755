// src/recovery/rules.rs

//! Built-in recovery rules
//!
//! Rules are consulted in table order. Patterns are case-insensitive and
//! match against the error text only; the failed command, when known, only
//! selects which fix command to offer.

use super::{FailureContext, RecoveryOption, RecoveryPriority};
use crate::error::{Error, Result};
use crate::exec::CommandSpec;
use crate::installers::{InstallMethod, PackageManager, PackageManagerInstaller};
use regex::{Regex, RegexBuilder};
use tracing::warn;

type Advise = fn(&FailureContext, bool) -> Vec<RecoveryOption>;

/// A named error pattern and the options it produces
pub struct Rule {
    name: &'static str,
    pattern: Regex,
    advise: Advise,
}

impl Rule {
    /// Compile `pattern` case-insensitively
    pub fn new(name: &'static str, pattern: &str, advise: Advise) -> Result<Self> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::ConfigError(format!("Invalid recovery pattern '{}': {}", name, e)))?;
        Ok(Self {
            name,
            pattern,
            advise,
        })
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn matches(&self, error: &str) -> bool {
        self.pattern.is_match(error)
    }

    pub fn options(&self, ctx: &FailureContext, use_sudo: bool) -> Vec<RecoveryOption> {
        (self.advise)(ctx, use_sudo)
    }
}

const TABLE: &[(&str, &str, Advise)] = &[
    (
        "permission-denied",
        r"permission denied|operation not permitted|are you root|must be run as root|requires (root|superuser)",
        permission_denied,
    ),
    (
        "package-manager-lock",
        r"could not get lock|unable to acquire the dpkg frontend lock|is another process using it|waiting for cache lock|unable to lock database|system management is locked|another app is currently holding the \w+ lock",
        lock_held,
    ),
    (
        "dpkg-interrupted",
        r"dpkg was interrupted|run 'dpkg --configure -a'",
        dpkg_interrupted,
    ),
    (
        "network",
        r"could not resolve|couldn't resolve host|temporary failure in name resolution|network is unreachable|no route to host|connection refused|connection timed out|failed to connect|operation timed out",
        network,
    ),
    (
        "tls-certificate",
        r"certificate verify failed|ssl certificate problem|unable to get local issuer certificate|x509|tls handshake",
        tls_certificate,
    ),
    (
        "package-not-found",
        r"unable to locate package|no match for argument|no package .+ available|no available formula|unable to select packages|not found in package names|no matching distribution found|could not find a version that satisfies|snap .+ not found|no remote refs found",
        package_not_found,
    ),
    (
        "command-not-found",
        r"command not found|no such file or directory|executable file not found|not found in \$?path",
        command_not_found,
    ),
    (
        "disk-full",
        r"no space left on device|disk full|not enough (free )?space|insufficient space",
        disk_full,
    ),
    (
        "broken-dependencies",
        r"unmet dependencies|held broken packages|broken packages|dependency problems|nothing provides|conflicting requests",
        broken_dependencies,
    ),
    ("http-404", r"\b404\b|not found \(404\)", http_not_found),
];

/// The built-in rule table
pub fn builtin() -> Vec<Rule> {
    TABLE
        .iter()
        .filter_map(|&(name, pattern, advise)| match Rule::new(name, pattern, advise) {
            Ok(rule) => Some(rule),
            Err(e) => {
                warn!("Skipping recovery rule: {}", e);
                None
            }
        })
        .collect()
}

/// Program of the failed command, ignoring a leading sudo
fn program(ctx: &FailureContext) -> Option<&str> {
    let mut words = ctx.command.as_deref()?.split_whitespace();
    match words.next()? {
        "sudo" => words.next(),
        other => Some(other),
    }
}

/// Package manager behind the failed command
fn manager(ctx: &FailureContext) -> Option<InstallMethod> {
    let method = match program(ctx)? {
        "apt-get" | "apt" | "dpkg" | "dpkg-query" => InstallMethod::Apt,
        "brew" => InstallMethod::Brew,
        "dnf" | "yum" => InstallMethod::Dnf,
        "zypper" => InstallMethod::Zypper,
        "apk" => InstallMethod::Apk,
        "snap" => InstallMethod::Snap,
        "flatpak" => InstallMethod::Flatpak,
        "emerge" => InstallMethod::Emerge,
        "eopkg" => InstallMethod::Eopkg,
        "mise" => InstallMethod::Mise,
        "python3" | "pip" | "pip3" => InstallMethod::Pip,
        _ => return None,
    };
    Some(method)
}

fn refresh_index(ctx: &FailureContext, use_sudo: bool, priority: RecoveryPriority) -> Option<RecoveryOption> {
    let method = manager(ctx)?;
    let manager = PackageManager::from_method(method)?;
    let action = PackageManagerInstaller::new(manager).update_command(use_sudo)?;
    Some(RecoveryOption::automated(
        "Refresh the package index",
        format!("Update the {} package lists and retry", method),
        priority,
        action,
    ))
}

fn permission_denied(ctx: &FailureContext, _use_sudo: bool) -> Vec<RecoveryOption> {
    let mut options = vec![RecoveryOption::manual(
        "Run with elevated privileges",
        "Set use_sudo = true in config.toml or re-run devboot as root",
        RecoveryPriority::Critical,
    )];
    if manager(ctx).is_some_and(|m| !m.needs_root()) {
        options.push(RecoveryOption::manual(
            "Check ownership of the install prefix",
            "User-level package managers should not need root; fix the ownership of their directories",
            RecoveryPriority::Recommended,
        ));
    }
    options
}

fn lock_held(_ctx: &FailureContext, _use_sudo: bool) -> Vec<RecoveryOption> {
    vec![
        RecoveryOption::manual(
            "Wait for the other package manager",
            "Another package operation (often automatic updates) holds the lock; retry when it finishes",
            RecoveryPriority::Critical,
        ),
        RecoveryOption::manual(
            "Find the lock holder",
            "Use `ps aux | grep -E 'apt|dpkg|dnf|zypper'` to find the process; stop it only if it is stuck",
            RecoveryPriority::Optional,
        ),
    ]
}

fn dpkg_interrupted(_ctx: &FailureContext, use_sudo: bool) -> Vec<RecoveryOption> {
    vec![RecoveryOption::automated(
        "Finish interrupted dpkg run",
        "Configure packages left unpacked by an interrupted install",
        RecoveryPriority::Critical,
        CommandSpec::new("dpkg")
            .args(["--configure", "-a"])
            .privileged(use_sudo),
    )]
}

fn network(ctx: &FailureContext, _use_sudo: bool) -> Vec<RecoveryOption> {
    let mut options = vec![RecoveryOption::manual(
        "Check network connectivity",
        "Verify DNS resolution and that any proxy settings are exported to sudo",
        RecoveryPriority::Recommended,
    )];
    // Only the rendered command line is known here, so the retry stays manual
    let retry = match &ctx.command {
        Some(command) => format!("Run `{}` again once the network is reachable", command),
        None => format!("Run `devboot {}` again once the network is reachable", ctx.operation),
    };
    options.push(RecoveryOption::manual(
        "Retry the command",
        retry,
        RecoveryPriority::Optional,
    ));
    options
}

fn tls_certificate(_ctx: &FailureContext, use_sudo: bool) -> Vec<RecoveryOption> {
    vec![
        RecoveryOption::automated(
            "Update CA certificates",
            "Rebuild the system certificate bundle",
            RecoveryPriority::Recommended,
            CommandSpec::new("update-ca-certificates").privileged(use_sudo),
        ),
        RecoveryOption::manual(
            "Check the system clock",
            "Certificates are rejected when the clock is far off; enable time synchronisation",
            RecoveryPriority::Optional,
        ),
    ]
}

fn package_not_found(ctx: &FailureContext, use_sudo: bool) -> Vec<RecoveryOption> {
    let mut options = vec![RecoveryOption::manual(
        "Check the package name",
        "The package may be named differently on this distribution; fix the command in the catalog",
        RecoveryPriority::Critical,
    )];
    options.extend(refresh_index(ctx, use_sudo, RecoveryPriority::Recommended));
    options
}

fn command_not_found(ctx: &FailureContext, _use_sudo: bool) -> Vec<RecoveryOption> {
    let description = match program(ctx) {
        Some(program) => format!(
            "`{}` is not available; install it first or pick another install method",
            program
        ),
        None => "A required program is not available; install it and retry".to_string(),
    };
    vec![RecoveryOption::manual(
        "Install the missing program",
        description,
        RecoveryPriority::Critical,
    )]
}

fn disk_full(ctx: &FailureContext, use_sudo: bool) -> Vec<RecoveryOption> {
    let mut options = vec![RecoveryOption::manual(
        "Free disk space",
        "Remove unused files; `df -h` shows which filesystem is full",
        RecoveryPriority::Critical,
    )];
    let clean = match manager(ctx) {
        Some(InstallMethod::Apt) => Some(CommandSpec::new("apt-get").arg("clean").privileged(use_sudo)),
        Some(InstallMethod::Dnf) => Some(CommandSpec::new("dnf").args(["clean", "all"]).privileged(use_sudo)),
        Some(InstallMethod::Zypper) => Some(CommandSpec::new("zypper").arg("clean").privileged(use_sudo)),
        Some(InstallMethod::Brew) => Some(CommandSpec::new("brew").arg("cleanup")),
        _ => None,
    };
    if let Some(action) = clean {
        options.push(RecoveryOption::automated(
            "Clean the package cache",
            "Delete cached package downloads",
            RecoveryPriority::Recommended,
            action,
        ));
    }
    options
}

fn broken_dependencies(ctx: &FailureContext, use_sudo: bool) -> Vec<RecoveryOption> {
    let apt = match manager(ctx) {
        Some(method) => method == InstallMethod::Apt,
        None => ctx.error.contains("apt") || ctx.error.contains("dpkg"),
    };
    if apt {
        vec![RecoveryOption::automated(
            "Fix broken packages",
            "Let apt install missing dependencies and repair partial installs",
            RecoveryPriority::Critical,
            CommandSpec::new("apt-get")
                .args(["install", "-f", "-y"])
                .privileged(use_sudo),
        )]
    } else {
        vec![RecoveryOption::manual(
            "Resolve conflicting packages",
            "Remove or upgrade the packages named in the error before retrying",
            RecoveryPriority::Critical,
        )]
    }
}

fn http_not_found(ctx: &FailureContext, use_sudo: bool) -> Vec<RecoveryOption> {
    let mut options = vec![RecoveryOption::manual(
        "Check the download URL",
        "The file no longer exists at that address; update the url in the catalog",
        RecoveryPriority::Recommended,
    )];
    options.extend(refresh_index(ctx, use_sudo, RecoveryPriority::Recommended));
    options
}

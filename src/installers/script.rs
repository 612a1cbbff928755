// src/installers/script.rs

//! Installer for apps shipped as a remote install script
//!
//! The script is downloaded to a temporary file first and only then piped
//! into the interpreter, so a truncated download never runs. Presence is
//! decided by looking the app's binary up on `PATH`.

use super::{InstallContext, InstallMethod, InstallState, Installer};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::exec::CommandSpec;
use tracing::info;

/// Runs `curl <url> | <interpreter>` style installs
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptInstaller;

impl ScriptInstaller {
    pub fn new() -> Self {
        Self
    }

    /// Name of the binary that marks `app` as installed
    fn binary(app: &AppConfig) -> &str {
        app.options.binary.as_deref().unwrap_or(&app.name)
    }

    /// Shell script that fetches `url` and feeds it to the interpreter
    pub fn install_command(&self, app: &AppConfig) -> Result<CommandSpec> {
        let url = app.url.as_deref().ok_or_else(|| {
            Error::ConfigError(format!("App '{}' uses curl but has no url", app.name))
        })?;
        if url.contains('\'') {
            return Err(Error::ConfigError(format!(
                "App '{}' has a url containing a quote",
                app.name
            )));
        }

        let interpreter = match app.command.trim() {
            "" => "sh",
            cmd => cmd,
        };
        let mut script = format!(
            "set -e; tmp=$(mktemp); trap 'rm -f \"$tmp\"' EXIT; \
             curl -fsSL '{url}' -o \"$tmp\"; {interpreter}"
        );
        for arg in &app.options.extra_args {
            script.push(' ');
            script.push_str(arg);
        }
        script.push_str(" < \"$tmp\"");

        Ok(CommandSpec::shell(script))
    }
}

impl Installer for ScriptInstaller {
    fn method(&self) -> &str {
        InstallMethod::Curl.as_ref()
    }

    fn check(&self, app: &AppConfig, _ctx: &InstallContext<'_>) -> InstallState {
        match which::which(Self::binary(app)) {
            Ok(_) => InstallState::Present,
            Err(which::Error::CannotFindBinaryPath) => InstallState::Absent,
            Err(e) => InstallState::Unknown(e.to_string()),
        }
    }

    fn install(&self, app: &AppConfig, ctx: &InstallContext<'_>) -> Result<()> {
        let spec = self.install_command(app)?;
        info!(
            "Installing {} from {}",
            app.name,
            app.url.as_deref().unwrap_or_default()
        );
        ctx.runner.run_checked(&spec)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppOptions;
    use crate::exec::{CommandOutput, ScriptedRunner};

    fn rustup() -> AppConfig {
        AppConfig::new("rustup", "curl", "sh -s -- -y").with_url("https://sh.rustup.rs")
    }

    #[test]
    fn test_install_downloads_before_running() {
        let spec = ScriptInstaller::new().install_command(&rustup()).unwrap();
        let script = &spec.arguments()[1];

        assert_eq!(spec.program(), "sh");
        assert_eq!(spec.arguments()[0], "-c");
        let download = script.find("curl -fsSL 'https://sh.rustup.rs'").unwrap();
        let run = script.find("sh -s -- -y < \"$tmp\"").unwrap();
        assert!(download < run);
        assert!(script.starts_with("set -e;"));
    }

    #[test]
    fn test_default_interpreter_is_sh() {
        let app = AppConfig::new("starship", "curl", "").with_url("https://starship.rs/install.sh");
        let spec = ScriptInstaller::new().install_command(&app).unwrap();
        assert!(spec.arguments()[1].ends_with("; sh < \"$tmp\""));
    }

    #[test]
    fn test_missing_url_fails_without_running() {
        let runner = ScriptedRunner::new();
        let ctx = InstallContext::new(&runner, false);
        let app = AppConfig::new("rustup", "curl", "sh");

        let err = ScriptInstaller::new().install(&app, &ctx).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn test_install_failure_propagates() {
        let runner = ScriptedRunner::new().on(
            "sh -c",
            CommandOutput::exit(22, "curl: (22) The requested URL returned error: 404"),
        );
        let ctx = InstallContext::new(&runner, false);

        let err = ScriptInstaller::new().install(&rustup(), &ctx).unwrap_err();
        assert!(matches!(err, Error::CommandFailed { code: Some(22), .. }));
    }

    #[test]
    fn test_check_looks_up_binary() {
        let runner = ScriptedRunner::new();
        let ctx = InstallContext::new(&runner, false);
        let app = AppConfig::new("ghost", "curl", "sh").with_options(AppOptions {
            binary: Some("devboot-no-such-binary-on-path".to_string()),
            ..Default::default()
        });

        assert_eq!(ScriptInstaller::new().check(&app, &ctx), InstallState::Absent);
        assert_eq!(runner.call_count(), 0);
    }
}

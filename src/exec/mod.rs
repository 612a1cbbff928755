// src/exec/mod.rs

//! Subprocess execution
//!
//! Installers describe what to run as a [`CommandSpec`] and hand it to a
//! [`CommandRunner`]. The only signals consumed from a finished process are
//! its exit code and its combined stdout/stderr.

mod scripted;

pub use scripted::ScriptedRunner;

use crate::error::{Error, Result};
use std::fmt;
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// A process invocation: program and arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Run `script` through `sh -c`
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new("sh").arg("-c").arg(script)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Prefix with `sudo` when `use_sudo` is set
    pub fn privileged(self, use_sudo: bool) -> Self {
        if !use_sudo {
            return self;
        }
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: "sudo".to_string(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Result of a process that ran to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if killed by a signal
    pub code: Option<i32>,
    /// stdout followed by stderr
    pub output: String,
}

impl CommandOutput {
    pub fn new(code: Option<i32>, output: impl Into<String>) -> Self {
        Self {
            code,
            output: output.into(),
        }
    }

    /// Exit code 0 with the given output
    pub fn ok(output: impl Into<String>) -> Self {
        Self::new(Some(0), output)
    }

    pub fn exit(code: i32, output: impl Into<String>) -> Self {
        Self::new(Some(code), output)
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into [`Error::CommandFailed`]
    pub fn check(self, spec: &CommandSpec) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(Error::CommandFailed {
                command: spec.to_string(),
                code: self.code,
                output: self.output.trim().to_string(),
            })
        }
    }
}

/// Executes [`CommandSpec`]s
pub trait CommandRunner {
    /// Run to completion; `Err` only when the process could not be run at all
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;

    /// Run and require a zero exit code
    fn run_checked(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.run(spec)?.check(spec)
    }
}

/// Runs commands on the host
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe
            && let Err(e) = pipe.read_to_end(&mut buf)
        {
            warn!("Failed to read child output: {}", e);
        }
        buf
    })
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let line = spec.to_string();
        debug!("Running: {}", line);

        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::SpawnError {
                command: line.clone(),
                source,
            })?;

        // Pipes are drained on their own threads so a chatty child cannot
        // block on a full pipe while we wait for it
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.timeout {
            Some(timeout) => match child.wait_timeout(timeout)? {
                Some(status) => status,
                None => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(Error::TimeoutError {
                        command: line,
                        seconds: timeout.as_secs(),
                    });
                }
            },
            None => child.wait()?,
        };

        let mut output = String::from_utf8_lossy(&stdout.join().unwrap_or_default()).into_owned();
        let err = stderr.join().unwrap_or_default();
        if !err.is_empty() {
            if !output.is_empty() && !output.ends_with('\n') {
                output.push('\n');
            }
            output.push_str(&String::from_utf8_lossy(&err));
        }

        debug!("`{}` exited with {:?}", line, status.code());
        Ok(CommandOutput::new(status.code(), output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_whitespace() {
        let spec = CommandSpec::shell("curl -fsSL https://example.com/install.sh | sh");
        assert_eq!(
            spec.to_string(),
            "sh -c 'curl -fsSL https://example.com/install.sh | sh'"
        );
    }

    #[test]
    fn test_privileged_prefixes_sudo() {
        let spec = CommandSpec::new("apt-get")
            .args(["install", "-y", "git"])
            .privileged(true);
        assert_eq!(spec.program(), "sudo");
        assert_eq!(spec.to_string(), "sudo apt-get install -y git");

        let plain = CommandSpec::new("brew").arg("install").privileged(false);
        assert_eq!(plain.to_string(), "brew install");
    }

    #[test]
    fn test_check_maps_failure() {
        let spec = CommandSpec::new("rpm").args(["-q", "foo"]);
        let err = CommandOutput::exit(1, "package foo is not installed\n")
            .check(&spec)
            .unwrap_err();
        match err {
            Error::CommandFailed { command, code, output } => {
                assert_eq!(command, "rpm -q foo");
                assert_eq!(code, Some(1));
                assert_eq!(output, "package foo is not installed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_combines_output() {
        let spec = CommandSpec::shell("echo out; echo err 1>&2; exit 3");
        let out = SystemRunner::new().run(&spec).unwrap();

        assert_eq!(out.code, Some(3));
        assert!(out.output.contains("out"));
        assert!(out.output.contains("err"));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_spawn_failure() {
        let spec = CommandSpec::new("devboot-definitely-missing-binary");
        let err = SystemRunner::new().run(&spec).unwrap_err();
        assert!(matches!(err, Error::SpawnError { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_timeout() {
        let spec = CommandSpec::new("sleep").arg("5");
        let err = SystemRunner::with_timeout(Some(Duration::from_millis(100)))
            .run(&spec)
            .unwrap_err();
        assert!(matches!(err, Error::TimeoutError { .. }));
    }
}

// src/exec/scripted.rs

//! A [`CommandRunner`] that answers from a script instead of spawning
//!
//! Used by tests. Replies are matched by prefix against the
//! rendered command line, first match wins; unmatched commands succeed with
//! empty output. A reply added with [`ScriptedRunner::once`] is consumed by
//! its first match. Every call is recorded.

use super::{CommandOutput, CommandRunner, CommandSpec};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::io;

#[derive(Debug, Clone)]
enum Reply {
    Output(CommandOutput),
    SpawnFailure,
}

#[derive(Debug)]
struct Scripted {
    prefix: String,
    reply: Reply,
    once: bool,
}

#[derive(Debug, Default)]
pub struct ScriptedRunner {
    replies: Mutex<Vec<Scripted>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `output` to commands starting with `prefix`
    pub fn on(self, prefix: impl Into<String>, output: CommandOutput) -> Self {
        self.push(prefix.into(), Reply::Output(output), false)
    }

    /// Like [`on`](Self::on), but only for the first matching command
    pub fn once(self, prefix: impl Into<String>, output: CommandOutput) -> Self {
        self.push(prefix.into(), Reply::Output(output), true)
    }

    /// Pretend the program for commands starting with `prefix` is missing
    pub fn fail_to_spawn(self, prefix: impl Into<String>) -> Self {
        self.push(prefix.into(), Reply::SpawnFailure, false)
    }

    fn push(mut self, prefix: String, reply: Reply, once: bool) -> Self {
        self.replies.get_mut().push(Scripted { prefix, reply, once });
        self
    }

    /// Every command line run so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Whether any recorded command starts with `prefix`
    pub fn ran(&self, prefix: &str) -> bool {
        self.calls.lock().iter().any(|c| c.starts_with(prefix))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let line = spec.to_string();
        self.calls.lock().push(line.clone());

        let reply = {
            let mut replies = self.replies.lock();
            match replies.iter().position(|r| line.starts_with(r.prefix.as_str())) {
                Some(i) if replies[i].once => Some(replies.remove(i).reply),
                Some(i) => Some(replies[i].reply.clone()),
                None => None,
            }
        };

        match reply {
            Some(Reply::Output(output)) => Ok(output),
            Some(Reply::SpawnFailure) => Err(Error::SpawnError {
                command: line,
                source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
            }),
            None => Ok(CommandOutput::ok("")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_matching_prefix_wins() {
        let runner = ScriptedRunner::new()
            .on("rpm -q git", CommandOutput::ok("git-2.44"))
            .on("rpm -q", CommandOutput::exit(1, "not installed"));

        let git = runner.run(&CommandSpec::new("rpm").args(["-q", "git"])).unwrap();
        let vim = runner.run(&CommandSpec::new("rpm").args(["-q", "vim"])).unwrap();

        assert!(git.success());
        assert_eq!(vim.code, Some(1));
        assert_eq!(runner.calls(), vec!["rpm -q git", "rpm -q vim"]);
    }

    #[test]
    fn test_spawn_failure_and_default() {
        let runner = ScriptedRunner::new().fail_to_spawn("snap");

        assert!(runner.run(&CommandSpec::new("snap").arg("list")).is_err());
        assert!(runner.run(&CommandSpec::new("true")).unwrap().success());
        assert!(runner.ran("snap list"));
        assert_eq!(runner.call_count(), 2);
    }

    #[test]
    fn test_once_reply_is_consumed() {
        let runner = ScriptedRunner::new()
            .once("apt-get install", CommandOutput::exit(100, "E: dpkg was interrupted"))
            .on("apt-get", CommandOutput::ok("done"));
        let spec = CommandSpec::new("apt-get").args(["install", "-y", "git"]);

        assert_eq!(runner.run(&spec).unwrap().code, Some(100));
        assert!(runner.run(&spec).unwrap().success());
        assert!(runner.run(&spec).unwrap().success());
    }
}

// src/recovery/mod.rs

//! Recovery advice for failed operations
//!
//! A failure is described by a [`FailureContext`]. The [`RecoveryAdvisor`]
//! matches its error text against an ordered rule table and returns ranked
//! [`RecoveryOption`]s. Critical or recommended options that carry a command
//! can be executed once through a [`CommandRunner`]; the rest are
//! instructions for the user.

mod rules;

pub use rules::Rule;

use crate::error::{Error, Result};
use crate::exec::{CommandRunner, CommandSpec};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

/// How strongly an option is suggested
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryPriority {
    Critical,
    Recommended,
    Optional,
}

impl fmt::Display for RecoveryPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::Recommended => write!(f, "recommended"),
            Self::Optional => write!(f, "optional"),
        }
    }
}

/// A single remediation suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryOption {
    pub title: String,
    pub description: String,
    pub priority: RecoveryPriority,
    /// Command that performs the fix; `None` for manual options
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_action")]
    pub action: Option<CommandSpec>,
}

fn serialize_action<S>(action: &Option<CommandSpec>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match action {
        Some(spec) => serializer.serialize_str(&spec.to_string()),
        None => serializer.serialize_none(),
    }
}

impl RecoveryOption {
    pub fn manual(
        title: impl Into<String>,
        description: impl Into<String>,
        priority: RecoveryPriority,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            priority,
            action: None,
        }
    }

    pub fn automated(
        title: impl Into<String>,
        description: impl Into<String>,
        priority: RecoveryPriority,
        action: CommandSpec,
    ) -> Self {
        Self {
            action: Some(action),
            ..Self::manual(title, description, priority)
        }
    }

    pub fn is_automated(&self) -> bool {
        self.action.is_some()
    }

    /// Automated and ranked critical or recommended
    pub fn is_executable(&self) -> bool {
        self.is_automated()
            && matches!(
                self.priority,
                RecoveryPriority::Critical | RecoveryPriority::Recommended
            )
    }
}

impl fmt::Display for RecoveryOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.priority, self.title, self.description)?;
        if let Some(action) = &self.action {
            write!(f, " (run: {})", action)?;
        }
        Ok(())
    }
}

/// What failed, as input to the advisor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FailureContext {
    /// What was being attempted, e.g. "install neovim"
    pub operation: String,
    /// Command line that failed, if a subprocess was involved
    pub command: Option<String>,
    /// Error text, including any captured output
    pub error: String,
}

impl FailureContext {
    pub fn new(operation: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            command: None,
            error: error.into(),
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Describe a library error raised while performing `operation`
    pub fn from_error(operation: impl Into<String>, err: &Error) -> Self {
        Self {
            operation: operation.into(),
            command: err.command().map(str::to_string),
            error: err.to_string(),
        }
    }
}

/// Outcome of executing an automated option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    pub success: bool,
    pub message: String,
}

/// Maps failures to ranked recovery options
pub struct RecoveryAdvisor {
    rules: Vec<Rule>,
    use_sudo: bool,
}

impl Default for RecoveryAdvisor {
    fn default() -> Self {
        Self::new()
    }
}

impl RecoveryAdvisor {
    /// Advisor with the built-in rule table
    pub fn new() -> Self {
        Self::with_rules(rules::builtin())
    }

    /// Advisor with a custom rule table, consulted in order
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            use_sudo: true,
        }
    }

    /// Whether automated fixes needing root are prefixed with sudo
    pub fn with_sudo(mut self, use_sudo: bool) -> Self {
        self.use_sudo = use_sudo;
        self
    }

    /// Ranked options for `ctx`, never empty
    pub fn analyze(&self, ctx: &FailureContext) -> Vec<RecoveryOption> {
        let mut options: Vec<RecoveryOption> = self
            .rules
            .iter()
            .filter(|rule| rule.matches(&ctx.error))
            .inspect(|rule| debug!("Recovery rule '{}' matched {}", rule.name(), ctx.operation))
            .flat_map(|rule| rule.options(ctx, self.use_sudo))
            .collect();

        if options.is_empty() {
            options.push(fallback(ctx));
        }

        // sort_by_key is stable, so rule order is kept within a priority
        options.sort_by_key(|option| option.priority);
        options
    }

    /// The highest ranked option that [`execute`](Self::execute) accepts
    pub fn first_executable(options: &[RecoveryOption]) -> Option<&RecoveryOption> {
        options.iter().find(|option| option.is_executable())
    }

    /// Run an automated critical or recommended option once
    ///
    /// A failing fix command is reported through the result, not as an
    /// error. Manual and optional options, and commands that cannot be
    /// started, are errors.
    pub fn execute(
        &self,
        option: &RecoveryOption,
        runner: &dyn CommandRunner,
    ) -> Result<RecoveryResult> {
        let action = option.action.as_ref().ok_or_else(|| {
            Error::RecoveryError(format!("'{}' is a manual step", option.title))
        })?;
        if option.priority == RecoveryPriority::Optional {
            return Err(Error::RecoveryError(format!(
                "'{}' is optional and is never run automatically",
                option.title
            )));
        }

        info!("Running recovery: {}", action);
        let out = runner.run(action)?;
        if out.success() {
            Ok(RecoveryResult {
                success: true,
                message: format!("{} succeeded", option.title),
            })
        } else {
            warn!("Recovery '{}' failed with {:?}", option.title, out.code);
            let detail = out.output.trim();
            Ok(RecoveryResult {
                success: false,
                message: if detail.is_empty() {
                    format!("{} failed", option.title)
                } else {
                    format!("{} failed: {}", option.title, detail)
                },
            })
        }
    }
}

fn fallback(ctx: &FailureContext) -> RecoveryOption {
    let description = match &ctx.command {
        Some(command) => format!(
            "Re-run `{}` manually to see the full output and fix the reported problem",
            command
        ),
        None => "Review the error output above and retry once the cause is fixed".to_string(),
    };
    RecoveryOption::manual("Inspect the failure", description, RecoveryPriority::Optional)
}

// src/steps.rs

//! Install steps and the sequential run loop
//!
//! A run is a list of [`Step`]s, one per requested app. Steps execute in
//! order; a failing step is marked with its error and the run moves on.

use crate::config::{AppConfig, Catalog};
use crate::engine::{InstallOutcome, InstallReport};
use crate::error::Result;
use crate::recovery::FailureContext;
use serde::Serialize;
use std::fmt;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Completed,
    Error(String),
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Error(msg) => write!(f, "error: {}", msg),
        }
    }
}

/// One app to install within a run
#[derive(Debug, Clone, Serialize)]
pub struct Step {
    pub name: String,
    /// `None` when the name is not in the catalog
    pub method: Option<String>,
    pub description: Option<String>,
    pub status: StepStatus,
    /// Present when the step failed
    pub failure: Option<FailureContext>,
    /// Present when the step completed
    pub report: Option<InstallReport>,
}

impl Step {
    pub fn new(app: &AppConfig) -> Self {
        Self {
            name: app.name.clone(),
            method: Some(app.method.clone()),
            description: app.description.clone(),
            status: StepStatus::Pending,
            failure: None,
            report: None,
        }
    }

    /// Step for a requested name, which may be missing from `catalog`
    ///
    /// A missing name is not an error here; installing the step reports it,
    /// so it fails alone.
    pub fn requested(catalog: &Catalog, name: &str) -> Self {
        match catalog.find(name) {
            Some(app) => Self::new(app),
            None => Self {
                name: name.to_string(),
                method: None,
                description: None,
                status: StepStatus::Pending,
                failure: None,
                report: None,
            },
        }
    }

    /// Label for progress output
    pub fn label(&self) -> String {
        match &self.description {
            Some(desc) => format!("{} ({})", self.name, desc),
            None => self.name.clone(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == StepStatus::Completed
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, StepStatus::Error(_))
    }
}

/// Receives run progress
pub trait StepObserver {
    fn step_started(&self, _index: usize, _total: usize, _step: &Step) {}
    fn step_finished(&self, _index: usize, _total: usize, _step: &Step) {}
    fn run_finished(&self, _summary: &RunSummary) {}
}

/// Observer that ignores everything
pub struct NoopObserver;

impl StepObserver for NoopObserver {}

/// Counts for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    /// Apps installed across all steps, dependencies included
    pub installed: usize,
    pub already_present: usize,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} steps completed, {} failed ({} installed, {} already present)",
            self.completed, self.total, self.failed, self.installed, self.already_present
        )
    }
}

/// Run every step in order, isolating failures
///
/// `action` performs one step. An error marks that step failed and the
/// loop continues with the next one.
pub fn run_steps<F>(steps: &mut [Step], observer: &dyn StepObserver, mut action: F) -> RunSummary
where
    F: FnMut(&Step) -> Result<InstallReport>,
{
    let total = steps.len();
    let mut summary = RunSummary {
        total,
        ..Default::default()
    };

    for (index, step) in steps.iter_mut().enumerate() {
        observer.step_started(index, total, step);

        match action(step) {
            Ok(report) => {
                info!("Step {} completed", step.name);
                summary.completed += 1;
                summary.installed += report.count(InstallOutcome::Installed);
                summary.already_present += report.count(InstallOutcome::AlreadyPresent);
                step.status = StepStatus::Completed;
                step.report = Some(report);
            }
            Err(e) => {
                error!("Step {} failed: {}", step.name, e);
                summary.failed += 1;
                step.failure = Some(FailureContext::from_error(format!("install {}", step.name), &e));
                step.status = StepStatus::Error(e.to_string());
            }
        }

        observer.step_finished(index, total, step);
    }

    observer.run_finished(&summary);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AppOutcome;
    use crate::error::Error;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl StepObserver for Recorder {
        fn step_started(&self, index: usize, total: usize, step: &Step) {
            self.events.lock().push(format!("start {}/{} {}", index + 1, total, step.name));
        }

        fn step_finished(&self, _index: usize, _total: usize, step: &Step) {
            self.events.lock().push(format!("{} {}", step.name, step.status));
        }

        fn run_finished(&self, summary: &RunSummary) {
            self.events.lock().push(format!("done {}", summary.failed));
        }
    }

    fn steps(names: &[&str]) -> Vec<Step> {
        names
            .iter()
            .map(|n| Step::new(&AppConfig::new(*n, "apt", *n)))
            .collect()
    }

    fn installed(name: &str) -> InstallReport {
        InstallReport {
            apps: vec![AppOutcome {
                name: name.to_string(),
                method: "apt".to_string(),
                outcome: InstallOutcome::Installed,
            }],
        }
    }

    #[test]
    fn test_failure_does_not_stop_later_steps() {
        let mut steps = steps(&["a", "b", "c"]);
        let observer = Recorder::default();

        let summary = run_steps(&mut steps, &observer, |step| {
            if step.name == "b" {
                Err(Error::CommandFailed {
                    command: "sudo apt-get install -y b".to_string(),
                    code: Some(100),
                    output: "E: Unable to locate package b".to_string(),
                })
            } else {
                Ok(installed(&step.name))
            }
        });

        assert_eq!(summary.completed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.installed, 2);
        assert!(!summary.is_success());
        assert!(steps[0].is_completed());
        assert!(steps[1].is_failed());
        assert!(steps[2].is_completed());

        let failure = steps[1].failure.as_ref().unwrap();
        assert_eq!(failure.operation, "install b");
        assert_eq!(failure.command.as_deref(), Some("sudo apt-get install -y b"));
    }

    #[test]
    fn test_observer_sees_every_step() {
        let mut steps = steps(&["x", "y"]);
        let observer = Recorder::default();

        run_steps(&mut steps, &observer, |step| Ok(installed(&step.name)));

        assert_eq!(
            *observer.events.lock(),
            vec!["start 1/2 x", "x completed", "start 2/2 y", "y completed", "done 0"]
        );
    }

    #[test]
    fn test_requested_name_missing_from_catalog() {
        let catalog = Catalog::new(vec![AppConfig::new("git", "apt", "git")]).unwrap();

        let git = Step::requested(&catalog, "git");
        assert_eq!(git.method.as_deref(), Some("apt"));

        let ghost = Step::requested(&catalog, "ghost");
        assert_eq!(ghost.name, "ghost");
        assert_eq!(ghost.method, None);
        assert_eq!(ghost.status, StepStatus::Pending);
    }

    #[test]
    fn test_empty_run() {
        let summary = run_steps(&mut [], &NoopObserver, |_| Ok(InstallReport::default()));
        assert_eq!(summary, RunSummary::default());
        assert!(summary.is_success());
        assert_eq!(summary.to_string(), "0 of 0 steps completed, 0 failed (0 installed, 0 already present)");
    }
}

// src/commands/progress.rs
//! Progress display for install runs
//!
//! An overall bar counts steps; a spinner line below it shows the app being
//! worked on. Failed steps are printed above the bars so they stay visible
//! after the run.

use devboot::steps::{RunSummary, Step, StepObserver, StepStatus};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct InstallProgress {
    multi: MultiProgress,
    overall: ProgressBar,
    status: ProgressBar,
    /// "Installing" or "Checking"
    verb: String,
}

impl InstallProgress {
    /// `total` is the number of steps in the run
    pub fn new(total: usize, operation: &str) -> Self {
        let multi = MultiProgress::new();

        let overall = ProgressBar::new(total as u64);
        overall.set_style(
            ProgressStyle::default_bar()
                .template("{msg} ({pos}/{len}) [{bar:40.green/dim}] {percent}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        overall.set_message(operation.to_string());

        let status = ProgressBar::new_spinner();
        status.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        status.enable_steady_tick(Duration::from_millis(100));

        let overall = multi.add(overall);
        let status = multi.add(status);

        Self {
            multi,
            overall,
            status,
            verb: operation.to_string(),
        }
    }

    fn println(&self, line: String) {
        // Falls back to plain stderr when the bars are hidden
        if self.multi.println(&line).is_err() || self.multi.is_hidden() {
            eprintln!("{}", line);
        }
    }
}

impl StepObserver for InstallProgress {
    fn step_started(&self, _index: usize, _total: usize, step: &Step) {
        let message = match &step.method {
            Some(method) => format!("{} {} via {}...", self.verb, step.label(), method),
            None => format!("{} {}...", self.verb, step.label()),
        };
        self.status.set_message(message);
    }

    fn step_finished(&self, _index: usize, _total: usize, step: &Step) {
        self.overall.inc(1);
        match &step.status {
            StepStatus::Completed => {
                self.status.set_message(format!("{} [done]", step.name));
            }
            StepStatus::Error(err) => {
                self.println(format!("  {} [FAILED: {}]", step.name, err));
            }
            StepStatus::Pending => {}
        }
    }

    fn run_finished(&self, summary: &RunSummary) {
        self.status.finish_and_clear();
        if summary.is_success() {
            self.overall.finish_with_message(format!("Done: {}", summary));
        } else {
            self.overall.abandon_with_message(format!("Finished with errors: {}", summary));
        }
    }
}

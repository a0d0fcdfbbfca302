//! The `tracing`-backed [`Log`] used by the `homegen` binary.
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::{Log, TaskEntry, TaskStatus};
use super::utils::log_file_path;

/// Emits every message as a `tracing` event and keeps each stage's outcome
/// so a summary can close the run.
///
/// Where events end up is decided by
/// [`init_subscriber`](super::subscriber::init_subscriber); without one they
/// are dropped, which is what tests rely on.
#[derive(Debug)]
pub struct Logger {
    stages: Mutex<Vec<TaskEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a logger for `homegen <command>`.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            stages: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
        }
    }

    /// Stage outcomes recorded so far, in pipeline order.
    #[must_use]
    pub fn task_entries(&self) -> Vec<TaskEntry> {
        self.stages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of stages that failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.task_entries()
            .iter()
            .filter(|t| t.status == TaskStatus::Failed)
            .count()
    }

    /// Print one line per recorded stage, a tally, and the log file path.
    pub fn print_summary(&self) {
        let stages = self.task_entries();
        if stages.is_empty() {
            return;
        }

        println!();
        tracing::info!(target: STAGE_TARGET, "Summary");
        for stage in &stages {
            let (icon, color) = match stage.status {
                TaskStatus::Ok => ("✓", "\x1b[32m"),
                TaskStatus::NotApplicable => ("·", "\x1b[2m"),
                TaskStatus::Skipped => ("○", "\x1b[33m"),
                TaskStatus::DryRun => ("~", "\x1b[37m"),
                TaskStatus::Failed => ("✗", "\x1b[31m"),
            };
            let reason = stage
                .message
                .as_deref()
                .map_or_else(String::new, |m| format!(" ({m})"));
            tracing::info!("{color}{icon} {}{reason}\x1b[0m", stage.name);
        }
        tracing::info!("{}", tally(&stages));
        if let Some(path) = &self.log_file {
            tracing::info!("\x1b[2mlog: {}\x1b[0m", path.display());
        }
    }
}

/// `"7 stages: 5 ok, 1 n/a, 1 skipped"`, listing only non-zero counts.
fn tally(stages: &[TaskEntry]) -> String {
    let count = |status: TaskStatus| stages.iter().filter(|s| s.status == status).count();
    let parts: Vec<String> = [
        (TaskStatus::Ok, "ok"),
        (TaskStatus::NotApplicable, "n/a"),
        (TaskStatus::Skipped, "skipped"),
        (TaskStatus::DryRun, "dry-run"),
        (TaskStatus::Failed, "failed"),
    ]
    .into_iter()
    .filter_map(|(status, label)| {
        let n = count(status);
        (n > 0).then(|| format!("{n} {label}"))
    })
    .collect();
    format!("{} stages: {}", stages.len(), parts.join(", "))
}

impl Log for Logger {
    fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        self.stages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(TaskEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
    }
}

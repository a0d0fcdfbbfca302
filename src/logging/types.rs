//! Core logging types: stage entries, status, and the [`Log`] trait.

/// Stage execution result for summary reporting.
#[derive(Debug, Clone)]
pub struct TaskEntry {
    /// Human-readable stage name.
    pub name: String,
    /// Final status of the stage.
    pub status: TaskStatus,
    /// Optional detail message (e.g., skip reason or error description).
    pub message: Option<String>,
}

/// Status of a completed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Stage completed successfully.
    Ok,
    /// Stage did not apply (e.g., no old generation to clean).
    NotApplicable,
    /// Stage was skipped, usually because an earlier stage failed.
    Skipped,
    /// Stage ran in dry-run mode; no changes were applied.
    DryRun,
    /// Stage encountered an error and could not complete.
    Failed,
}

/// Abstraction over logging backends.
///
/// Stage code logs through this trait so tests can substitute a logger that
/// records messages instead of printing them.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (suppressed on console unless verbose).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record a stage result for the summary.
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>);
}

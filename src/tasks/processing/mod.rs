//! Resource processing loop and the context stages share.

pub mod context;

pub use context::Context;

use anyhow::Result;

use crate::resources::{Resource, ResourceState};

/// Result of a single stage execution.
///
/// # Examples
///
/// ```
/// use homegen::tasks::TaskResult;
///
/// let ok = TaskResult::Ok;
/// let skipped = TaskResult::Skipped("no old generation".into());
/// let dry = TaskResult::DryRun;
///
/// assert!(matches!(ok, TaskResult::Ok));
/// assert!(matches!(skipped, TaskResult::Skipped(_)));
/// assert!(matches!(dry, TaskResult::DryRun));
/// ```
#[derive(Debug, Clone)]
pub enum TaskResult {
    /// Stage completed successfully.
    Ok,
    /// Stage had nothing to do.
    Skipped(String),
    /// Stage ran in dry-run mode.
    DryRun,
}

/// Counters for stages that process many paths.
///
/// # Examples
///
/// ```
/// use homegen::tasks::TaskStats;
///
/// let mut stats = TaskStats::new();
/// stats.changed = 3;
/// stats.already_ok = 10;
///
/// assert_eq!(stats.summary(false), "3 changed, 10 already ok");
/// assert_eq!(stats.summary(true), "3 would change, 10 already ok");
/// ```
///
/// When paths are skipped, the summary includes the count:
///
/// ```
/// use homegen::tasks::TaskStats;
///
/// let stats = TaskStats { changed: 1, already_ok: 2, skipped: 3 };
/// assert_eq!(stats.summary(false), "1 changed, 2 already ok, 3 skipped");
/// ```
#[derive(Debug, Default)]
pub struct TaskStats {
    /// Number of paths changed.
    pub changed: u32,
    /// Number of paths already in the desired state.
    pub already_ok: u32,
    /// Number of paths left alone.
    pub skipped: u32,
}

impl TaskStats {
    /// Create a new empty stats counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Format the summary string (e.g. "3 changed, 10 already ok, 1 skipped").
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        let verb = if dry_run { "would change" } else { "changed" };
        if self.skipped > 0 {
            format!(
                "{} {verb}, {} already ok, {} skipped",
                self.changed, self.already_ok, self.skipped
            )
        } else {
            format!("{} {verb}, {} already ok", self.changed, self.already_ok)
        }
    }

    /// Log the summary and return the appropriate `TaskResult`.
    #[must_use]
    pub fn finish(self, ctx: &Context) -> TaskResult {
        ctx.log.info(&self.summary(ctx.dry_run));
        if ctx.dry_run {
            TaskResult::DryRun
        } else {
            TaskResult::Ok
        }
    }
}

impl std::ops::AddAssign for TaskStats {
    fn add_assign(&mut self, other: Self) {
        self.changed += other.changed;
        self.already_ok += other.already_ok;
        self.skipped += other.skipped;
    }
}

/// How [`process_resources`] reports on the paths it walks.
///
/// # Examples
///
/// ```
/// use homegen::tasks::ProcessOpts;
///
/// let opts = ProcessOpts::new("remove").warn_invalid();
/// assert_eq!(opts.verb, "remove");
/// assert!(opts.warn_invalid);
/// ```
#[derive(Debug)]
pub struct ProcessOpts<'a> {
    /// Verb for log messages (e.g., "link", "remove").
    pub verb: &'a str,
    /// Report `Invalid` resources as warnings instead of debug messages.
    pub warn_invalid: bool,
}

impl<'a> ProcessOpts<'a> {
    /// Options that log `Invalid` resources at debug level.
    #[must_use]
    pub const fn new(verb: &'a str) -> Self {
        Self {
            verb,
            warn_invalid: false,
        }
    }

    /// Warn about resources that are left alone.
    #[must_use]
    pub const fn warn_invalid(mut self) -> Self {
        self.warn_invalid = true;
        self
    }
}

/// Walk `resources` in order, bringing every `Missing` or `Incorrect` one
/// into its desired state.
///
/// Each change to the live root completes before the next one starts, and
/// the interrupt flag is checked before every change. In dry-run mode the
/// change is only previewed.
///
/// # Errors
///
/// Returns an error if a state check or a change fails, or if the run is
/// interrupted. Nothing after the failing resource is touched.
pub fn process_resources<R: Resource>(
    ctx: &Context,
    resources: impl IntoIterator<Item = R>,
    opts: &ProcessOpts,
) -> Result<TaskResult> {
    let mut stats = TaskStats::new();
    for resource in resources {
        let desc = resource.description();
        let preview = match resource.current_state()? {
            ResourceState::Correct => {
                ctx.log.debug(&format!("ok: {desc}"));
                stats.already_ok += 1;
                continue;
            }
            ResourceState::Invalid { reason } => {
                let msg = format!("skipping {desc}: {reason}");
                if opts.warn_invalid {
                    ctx.log.warn(&msg);
                } else {
                    ctx.log.debug(&msg);
                }
                stats.skipped += 1;
                continue;
            }
            ResourceState::Missing => format!("would {}: {desc}", opts.verb),
            ResourceState::Incorrect { current } => {
                format!("would {} {desc} (currently {current})", opts.verb)
            }
        };

        if ctx.dry_run {
            ctx.log.dry_run(&preview);
        } else {
            ctx.check_interrupted()?;
            resource.apply()?;
            ctx.log.debug(&format!("{}: {desc}", opts.verb));
        }
        stats.changed += 1;
    }
    Ok(stats.finish(ctx))
}

//! Named, dependency-ordered stages of the activation pipeline.
pub mod check_targets;
pub mod clean;
pub mod detect_changes;
pub mod graph;
pub mod hooks;
pub mod link;
mod processing;
pub mod stage;
pub mod validate;

/// Implement [`Task::dependencies`] by expanding to the required
/// `fn dependencies(&self) -> &[TypeId]` method body.
///
/// The `const DEPS` intermediate gives the slice the `'static` lifetime the
/// return type requires.
///
/// # Examples
///
/// ```ignore
/// task_deps![super::stage::StageGeneration]
/// // expands to:
/// //   fn dependencies(&self) -> &[std::any::TypeId] {
/// //       const DEPS: &[std::any::TypeId] = &[
/// //           std::any::TypeId::of::<super::stage::StageGeneration>(),
/// //       ];
/// //       DEPS
/// //   }
/// ```
macro_rules! task_deps {
    [$($dep:ty),+ $(,)?] => {
        fn dependencies(&self) -> &[std::any::TypeId] {
            const DEPS: &[std::any::TypeId] = &[$(std::any::TypeId::of::<$dep>()),+];
            DEPS
        }
    };
}

pub(crate) use task_deps;

pub use processing::Context;
pub use processing::{ProcessOpts, TaskResult, TaskStats, process_resources};

use std::any::TypeId;

use anyhow::Result;

use crate::logging::TaskStatus;

/// A named, executable pipeline stage.
///
/// The `'static` bound gives each stage struct a stable [`TypeId`], which the
/// graph uses to match dependency declarations (see [`Task::task_id`] and
/// [`Task::dependencies`]).
pub trait Task: Send + Sync + 'static {
    /// Human-readable stage name.
    fn name(&self) -> &str;

    /// The concrete `TypeId` of this stage, used as a dependency identifier.
    fn task_id(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    /// Stages that must complete before this one starts.
    ///
    /// The default implementation returns an empty slice.
    fn dependencies(&self) -> &[TypeId] {
        &[]
    }

    /// Whether this stage has anything to do for the current run.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Execute the stage.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage cannot complete; the pipeline stops.
    fn run(&self, ctx: &Context) -> Result<TaskResult>;
}

/// The stages run by the `activate` command, in declaration order.
///
/// Execution order is derived from each stage's [`Task::dependencies`].
#[must_use]
pub fn all_activate_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(validate::ValidateCollisions),
        Box::new(stage::StageGeneration),
        Box::new(check_targets::CheckLinkTargets),
        Box::new(detect_changes::DetectChanges),
        Box::new(clean::CleanOldGeneration),
        Box::new(link::LinkNewGeneration),
        Box::new(hooks::RunChangeHooks),
    ]
}

/// The stages run by the `build` command.
#[must_use]
pub fn all_build_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(validate::ValidateCollisions),
        Box::new(stage::StageGeneration),
    ]
}

/// Execute a stage, recording the result in the logger.
///
/// # Errors
///
/// Returns the stage's error after logging and recording it.
pub fn execute(task: &dyn Task, ctx: &Context) -> Result<()> {
    if !task.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping stage: {} (not applicable)", task.name()));
        ctx.log
            .record_task(task.name(), TaskStatus::NotApplicable, None);
        return Ok(());
    }

    ctx.log.stage(task.name());

    match task.run(ctx) {
        Ok(TaskResult::Ok) => {
            ctx.log.record_task(task.name(), TaskStatus::Ok, None);
            Ok(())
        }
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.info(&format!("skipped: {reason}"));
            ctx.log
                .record_task(task.name(), TaskStatus::Skipped, Some(&reason));
            Ok(())
        }
        Ok(TaskResult::DryRun) => {
            ctx.log.record_task(task.name(), TaskStatus::DryRun, None);
            Ok(())
        }
        Err(e) => {
            ctx.log.error(&format!("{}: {e:#}", task.name()));
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some(&format!("{e:#}")));
            Err(e)
        }
    }
}

/// Run `tasks` in dependency order, stopping at the first failure.
///
/// Stages after a failure are recorded as skipped.
///
/// # Errors
///
/// Returns a [`crate::error::TaskError`] if the stage graph is invalid (no
/// stage runs), or the first stage error.
pub fn run_pipeline(tasks: &[Box<dyn Task>], ctx: &Context) -> Result<()> {
    let refs: Vec<&dyn Task> = tasks.iter().map(Box::as_ref).collect();
    let order = graph::execution_order(&refs)?;

    let mut failure = None;
    for task in order.into_iter().filter_map(|i| refs.get(i)) {
        if failure.is_some() {
            ctx.log.record_task(
                task.name(),
                TaskStatus::Skipped,
                Some("earlier stage failed"),
            );
            continue;
        }
        if let Err(e) = execute(*task, ctx) {
            failure = Some(e);
        }
    }
    failure.map_or(Ok(()), Err)
}

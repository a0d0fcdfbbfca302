//! Stage: build the new generation's tree.
use anyhow::Result;

use super::validate::ValidateCollisions;
use super::{Context, Task, TaskResult, task_deps};
use crate::generation::build_generation;

/// Build the new generation root from the manifest.
///
/// Runs in dry-run mode as well; only the generation root is written.
#[derive(Debug)]
pub struct StageGeneration;

impl Task for StageGeneration {
    fn name(&self) -> &'static str {
        "Stage new generation"
    }

    task_deps![ValidateCollisions];

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let root = ctx.settings.new_root()?;
        let tree = build_generation(&ctx.config.files, root, &*ctx.log)?;
        ctx.log.info(&format!(
            "{} leaves staged at {}",
            tree.len(),
            root.display()
        ));
        ctx.set_staged(tree);
        Ok(TaskResult::Ok)
    }
}

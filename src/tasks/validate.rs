//! Stage: reject manifests with colliding targets.
use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::config::validation::{CollisionValidator, lint};

/// Fail before any filesystem work if two specs share a target.
///
/// Soft problems are logged as warnings and do not stop the pipeline.
#[derive(Debug)]
pub struct ValidateCollisions;

impl Task for ValidateCollisions {
    fn name(&self) -> &'static str {
        "Validate collisions"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let files = &ctx.config.files;
        CollisionValidator::new(files).check()?;

        for warning in lint(files) {
            ctx.log.warn(&warning.to_string());
        }
        ctx.log
            .info(&format!("{} files, no conflicting targets", files.len()));
        Ok(TaskResult::Ok)
    }
}

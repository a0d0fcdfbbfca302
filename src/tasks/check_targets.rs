//! Stage: refuse to activate over unmanaged files.
use anyhow::Result;
use std::path::{Path, PathBuf};

use super::stage::StageGeneration;
use super::{Context, Task, TaskResult, task_deps};
use crate::error::ActivationError;
use crate::generation::StagedTree;
use crate::generation::content::same_content;
use crate::generation::paths::normalize_relative;
use crate::resources::helpers::fs::exists_no_follow;

/// Check every live path the new generation will link.
///
/// A live path is fine when it is absent, already a symlink, under a forced
/// target, identical to the staged entry, or movable to a free backup path.
/// All offenders are reported together before anything is changed.
#[derive(Debug)]
pub struct CheckLinkTargets;

impl Task for CheckLinkTargets {
    fn name(&self) -> &'static str {
        "Check link targets"
    }

    task_deps![StageGeneration];

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let staged = ctx.staged()?;
        let forced: Vec<PathBuf> = ctx
            .config
            .files
            .iter()
            .filter(|s| s.force)
            .map(|s| normalize_relative(&s.target))
            .collect();

        let mut paths = Vec::new();
        for (rel, _) in staged.iter() {
            if let Some(offender) = clobbered_path(ctx, &staged, rel, &forced) {
                ctx.log
                    .debug(&format!("would clobber: {}", offender.display()));
                paths.push(offender);
            }
        }

        if !paths.is_empty() {
            return Err(ActivationError::WouldClobber { paths }.into());
        }
        ctx.log
            .info(&format!("{} link targets checked", staged.len()));
        Ok(TaskResult::Ok)
    }
}

/// The path that linking `rel` would destroy, if any.
fn clobbered_path(
    ctx: &Context,
    staged: &StagedTree,
    rel: &Path,
    forced: &[PathBuf],
) -> Option<PathBuf> {
    let live = ctx.settings.home.join(rel);
    let meta = live.symlink_metadata().ok()?;
    if meta.is_symlink() || forced.iter().any(|f| rel.starts_with(f)) {
        return None;
    }
    if same_content(&staged.path_of(rel), &live) {
        return None;
    }
    match ctx.settings.backup_path(&live) {
        Some(backup) if ctx.settings.backup_overwrite || !exists_no_follow(&backup) => None,
        Some(backup) => Some(backup),
        None => Some(live),
    }
}

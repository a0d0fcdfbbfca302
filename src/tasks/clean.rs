//! Stage: remove links the new generation no longer provides.
use anyhow::Result;
use std::path::{Path, PathBuf};

use super::detect_changes::DetectChanges;
use super::{Context, ProcessOpts, Task, TaskResult, process_resources, task_deps};
use crate::generation::StagedTree;
use crate::resources::StaleLinkResource;

/// Delete live links to old-generation leaves that the new generation drops.
///
/// Links that do not point into a managed location, and real files, are
/// left in place with a warning.
#[derive(Debug)]
pub struct CleanOldGeneration;

impl Task for CleanOldGeneration {
    fn name(&self) -> &'static str {
        "Clean old generation"
    }

    task_deps![DetectChanges];

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.settings.old_root.is_some()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let Some(old_root) = ctx.settings.old_root.as_deref() else {
            return Ok(TaskResult::Skipped("no old generation".to_string()));
        };
        if !old_root.exists() {
            return Ok(TaskResult::Skipped(format!(
                "old generation {} not found",
                old_root.display()
            )));
        }

        let old = StagedTree::scan(old_root)?;
        let new = ctx.staged()?;
        let stale = stale_leaves(&old, &new);
        if stale.is_empty() {
            return Ok(TaskResult::Skipped("nothing to remove".to_string()));
        }

        let home = ctx.settings.home.as_path();
        let managed: Vec<PathBuf> = ctx
            .settings
            .managed_roots()
            .into_iter()
            .map(Path::to_path_buf)
            .collect();
        let resources = stale
            .iter()
            .map(|rel| StaleLinkResource::new(rel, home, managed.clone()));
        process_resources(ctx, resources, &ProcessOpts::new("remove").warn_invalid())
    }
}

/// Leaves of `old` that `new` does not provide, in path order.
#[must_use]
pub fn stale_leaves(old: &StagedTree, new: &StagedTree) -> Vec<PathBuf> {
    old.iter()
        .filter(|(rel, _)| !new.contains(rel))
        .map(|(rel, _)| rel.to_path_buf())
        .collect()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::FileSpec;
    use crate::generation::build_generation;
    use crate::tasks::test_helpers::{RecordingLog, TestEnv, context_with};
    use std::fs;
    use std::os::unix::fs::symlink;

    /// Build `old` from `old_specs`, link its leaves into home, then stage
    /// `new_specs` as the new generation.
    fn transition(
        env: &TestEnv,
        old_specs: &[FileSpec],
        new_specs: Vec<FileSpec>,
    ) -> (Context, std::sync::Arc<RecordingLog>) {
        let old_root = env.gen_root("old");
        let old = build_generation(old_specs, &old_root, &RecordingLog::new()).unwrap();
        for (rel, _) in old.iter() {
            let live = env.home().join(rel);
            fs::create_dir_all(live.parent().unwrap()).unwrap();
            symlink(old.path_of(rel), &live).unwrap();
        }
        let settings = env.settings().with_old_root(Some(&old_root)).unwrap();
        let (ctx, log, _) = context_with(new_specs, settings);
        crate::tasks::stage::StageGeneration.run(&ctx).unwrap();
        (ctx, log)
    }

    #[test]
    fn not_applicable_without_old_root() {
        let env = TestEnv::new();
        let (ctx, _log, _) = context_with(Vec::new(), env.settings());
        assert!(!CleanOldGeneration.should_run(&ctx));
    }

    #[test]
    fn removes_dropped_links_and_keeps_shared_ones() {
        let env = TestEnv::new();
        let a = env.store_file("a", "a");
        let b = env.store_file("b", "b");
        let old_specs = vec![
            FileSpec::new("a", ".a", a.clone()),
            FileSpec::new("b", ".config/b/b", b),
        ];
        let (ctx, _log) = transition(&env, &old_specs, vec![FileSpec::new("a", ".a", a)]);

        CleanOldGeneration.run(&ctx).unwrap();

        assert!(env.home().join(".a").symlink_metadata().is_ok());
        assert!(env.home().join(".config/b/b").symlink_metadata().is_err());
        assert!(!env.home().join(".config").exists(), "empty parents pruned");
        assert!(env.home().exists());
    }

    #[test]
    fn replaced_link_is_left_with_warning() {
        let env = TestEnv::new();
        let b = env.store_file("b", "b");
        let (ctx, log) = transition(&env, &[FileSpec::new("b", ".b", b)], Vec::new());
        fs::remove_file(env.home().join(".b")).unwrap();
        fs::write(env.home().join(".b"), "user edit").unwrap();

        CleanOldGeneration.run(&ctx).unwrap();

        assert_eq!(fs::read_to_string(env.home().join(".b")).unwrap(), "user edit");
        assert!(log.warned(".b"));
    }

    #[test]
    fn path_reachable_through_new_directory_link_is_kept() {
        let env = TestEnv::new();
        env.store_file("nvim/init.lua", "-- init");
        let mut mirrored = FileSpec::new("nvim", ".config/nvim", env.store.path().join("nvim"));
        mirrored.recursive = true;
        let linked = FileSpec::new("nvim", ".config/nvim", env.store.path().join("nvim"));
        let (ctx, _log) = transition(&env, &[mirrored], vec![linked]);

        let old = StagedTree::scan(&env.gen_root("old")).unwrap();
        let new = ctx.staged().unwrap();
        assert!(stale_leaves(&old, &new).is_empty());
    }

    #[test]
    fn dry_run_removes_nothing() {
        let env = TestEnv::new();
        let b = env.store_file("b", "b");
        let (ctx, log) = transition(&env, &[FileSpec::new("b", ".b", b)], Vec::new());
        let ctx = ctx.with_dry_run(true);

        let result = CleanOldGeneration.run(&ctx).unwrap();
        assert!(matches!(result, TaskResult::DryRun));
        assert!(env.home().join(".b").symlink_metadata().is_ok());
        assert!(log.previewed("would remove"));
    }
}

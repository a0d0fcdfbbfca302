//! Stage: point the live root at the new generation.
use anyhow::Result;

use super::clean::CleanOldGeneration;
use super::{Context, ProcessOpts, Task, TaskResult, process_resources, task_deps};
use crate::resources::HomeLinkResource;

/// Link every leaf of the new generation into the live root.
///
/// Each link is swapped in atomically, so a live path never goes missing.
#[derive(Debug)]
pub struct LinkNewGeneration;

impl Task for LinkNewGeneration {
    fn name(&self) -> &'static str {
        "Link new generation"
    }

    task_deps![CleanOldGeneration];

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let staged = ctx.staged()?;
        let home = ctx.settings.home.as_path();
        let new_root = staged.root();
        let resources = staged.iter().map(|(rel, _)| {
            let backup = ctx.settings.backup_path(&home.join(rel));
            HomeLinkResource::new(rel, home, new_root, backup)
        });
        process_resources(ctx, resources, &ProcessOpts::new("link"))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::FileSpec;
    use crate::error::ActivationError;
    use crate::tasks::stage::StageGeneration;
    use crate::tasks::test_helpers::{RecordingLog, TestEnv, context_with};
    use std::fs;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    fn staged(env: &TestEnv, specs: Vec<FileSpec>) -> (Context, Arc<RecordingLog>) {
        let (ctx, log, _) = context_with(specs, env.settings());
        StageGeneration.run(&ctx).unwrap();
        (ctx, log)
    }

    #[test]
    fn links_every_leaf() {
        let env = TestEnv::new();
        let a = env.store_file("a", "a");
        let b = env.store_file("b", "b");
        let specs = vec![
            FileSpec::new("a", ".a", a),
            FileSpec::new("b", ".config/b", b),
        ];
        let (ctx, log) = staged(&env, specs);

        LinkNewGeneration.run(&ctx).unwrap();

        let new_root = env.gen_root("new");
        assert_eq!(fs::read_link(env.home().join(".a")).unwrap(), new_root.join(".a"));
        assert_eq!(
            fs::read_link(env.home().join(".config/b")).unwrap(),
            new_root.join(".config/b")
        );
        assert!(log.contains("2 changed, 0 already ok"));
    }

    #[test]
    fn second_run_changes_nothing() {
        let env = TestEnv::new();
        let a = env.store_file("a", "a");
        let (ctx, log) = staged(&env, vec![FileSpec::new("a", ".a", a)]);

        LinkNewGeneration.run(&ctx).unwrap();
        LinkNewGeneration.run(&ctx).unwrap();

        assert!(log.contains("0 changed, 1 already ok"));
    }

    #[test]
    fn unmanaged_file_is_backed_up() {
        let env = TestEnv::new();
        let a = env.store_file("a", "new");
        fs::write(env.home().join(".a"), "mine").unwrap();
        let settings = env.settings().with_backup(Some("bak".to_string()), false);
        let (ctx, _log, _) = context_with(vec![FileSpec::new("a", ".a", a)], settings);
        StageGeneration.run(&ctx).unwrap();

        LinkNewGeneration.run(&ctx).unwrap();

        assert_eq!(fs::read_to_string(env.home().join(".a.bak")).unwrap(), "mine");
        assert_eq!(fs::read_to_string(env.home().join(".a")).unwrap(), "new");
        assert!(env.home().join(".a").symlink_metadata().unwrap().is_symlink());
    }

    #[test]
    fn identical_real_file_is_left_alone() {
        let env = TestEnv::new();
        let a = env.store_file("a", "same");
        fs::write(env.home().join(".a"), "same").unwrap();
        let (ctx, _log) = staged(&env, vec![FileSpec::new("a", ".a", a)]);

        LinkNewGeneration.run(&ctx).unwrap();

        assert!(!env.home().join(".a").symlink_metadata().unwrap().is_symlink());
    }

    #[test]
    fn non_empty_directory_is_fatal() {
        let env = TestEnv::new();
        let a = env.store_file("a", "a");
        fs::create_dir_all(env.home().join(".a/inner")).unwrap();
        fs::write(env.home().join(".a/inner/f"), "x").unwrap();
        let (ctx, _log) = staged(&env, vec![FileSpec::new("a", ".a", a)]);

        let err = LinkNewGeneration.run(&ctx).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ActivationError>(),
            Some(ActivationError::NonEmptyDirectory(_))
        ));
        assert!(env.home().join(".a/inner/f").exists());
    }

    #[test]
    fn interrupt_leaves_live_root_untouched() {
        let env = TestEnv::new();
        let a = env.store_file("a", "a");
        let (ctx, _log) = staged(&env, vec![FileSpec::new("a", ".a", a)]);
        ctx.interrupted.store(true, Ordering::SeqCst);

        let err = LinkNewGeneration.run(&ctx).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ActivationError>(),
            Some(ActivationError::Interrupted)
        ));
        assert!(env.home().join(".a").symlink_metadata().is_err());
    }
}

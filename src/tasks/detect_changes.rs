//! Stage: record which hooked targets change with this activation.
use anyhow::Result;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

use super::check_targets::CheckLinkTargets;
use super::{Context, Task, TaskResult, task_deps};
use crate::config::FileSpec;
use crate::generation::content::same_content;
use crate::generation::paths::normalize_relative;

/// Whether each hooked target differs between the live root and the new
/// generation.
///
/// # Examples
///
/// ```
/// use homegen::tasks::detect_changes::ChangeRecord;
///
/// let mut record = ChangeRecord::default();
/// record.insert(".bashrc", true);
/// record.insert(".vimrc", false);
///
/// assert!(record.is_changed(".bashrc"));
/// assert!(!record.is_changed(".vimrc"));
/// assert!(!record.is_changed(".unknown"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeRecord {
    changed: BTreeMap<String, bool>,
}

impl ChangeRecord {
    /// Record whether `target` changed.
    pub fn insert(&mut self, target: &str, changed: bool) {
        self.changed.insert(target.to_string(), changed);
    }

    /// Whether `target` was recorded as changed.
    #[must_use]
    pub fn is_changed(&self, target: &str) -> bool {
        self.changed.get(target).copied().unwrap_or(false)
    }

    /// Number of targets recorded as changed.
    #[must_use]
    pub fn changed_count(&self) -> usize {
        self.changed.values().filter(|c| **c).count()
    }

    /// Number of recorded targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changed.len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }
}

/// Compare each hooked target before the live root is touched.
#[derive(Debug)]
pub struct DetectChanges;

impl Task for DetectChanges {
    fn name(&self) -> &'static str {
        "Detect changes"
    }

    task_deps![CheckLinkTargets];

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let new_root = ctx.settings.new_root()?;
        let home = ctx.settings.home.as_path();
        let hooked: Vec<&FileSpec> = ctx.config.files.iter().filter(|s| s.has_hook()).collect();

        let results: Vec<(&str, bool)> = if ctx.parallel {
            hooked
                .par_iter()
                .map(|spec| (spec.target.as_str(), differs(new_root, home, spec)))
                .collect()
        } else {
            hooked
                .iter()
                .map(|spec| (spec.target.as_str(), differs(new_root, home, spec)))
                .collect()
        };

        let mut record = ChangeRecord::default();
        for (target, changed) in results {
            if changed {
                ctx.log.debug(&format!("changed: {target}"));
            }
            record.insert(target, changed);
        }
        ctx.log.info(&format!(
            "{} of {} hooked targets changed",
            record.changed_count(),
            record.len()
        ));
        ctx.set_changes(record);
        Ok(TaskResult::Ok)
    }
}

fn differs(new_root: &Path, home: &Path, spec: &FileSpec) -> bool {
    let rel = normalize_relative(&spec.target);
    !same_content(&new_root.join(&rel), &home.join(&rel))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::tasks::stage::StageGeneration;
    use crate::tasks::test_helpers::{TestEnv, context_with};
    use std::fs;

    fn hooked(name: &str, target: &str, source: std::path::PathBuf) -> FileSpec {
        let mut spec = FileSpec::new(name, target, source);
        spec.on_change = format!("echo {name}");
        spec
    }

    fn detect(env: &TestEnv, specs: Vec<FileSpec>, parallel: bool) -> ChangeRecord {
        let (ctx, _log, _) = context_with(specs, env.settings());
        let ctx = ctx.with_parallel(parallel);
        StageGeneration.run(&ctx).unwrap();
        DetectChanges.run(&ctx).unwrap();
        ctx.changes()
    }

    #[test]
    fn absent_live_path_is_changed() {
        let env = TestEnv::new();
        let src = env.store_file("a", "a");
        let record = detect(&env, vec![hooked("a", ".a", src)], false);
        assert!(record.is_changed(".a"));
    }

    #[test]
    fn identical_live_file_is_unchanged() {
        let env = TestEnv::new();
        let src = env.store_file("a", "same");
        fs::write(env.home().join(".a"), "same").unwrap();
        let record = detect(&env, vec![hooked("a", ".a", src)], false);
        assert!(!record.is_changed(".a"));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn different_bytes_are_changed() {
        let env = TestEnv::new();
        let src = env.store_file("a", "new");
        fs::write(env.home().join(".a"), "old").unwrap();
        let record = detect(&env, vec![hooked("a", ".a", src)], true);
        assert!(record.is_changed(".a"));
    }

    #[test]
    fn directory_targets_compare_structurally() {
        let env = TestEnv::new();
        env.store_file("nvim/init.lua", "-- v1");
        env.store_file("nvim/lua/opts.lua", "-- opts");
        fs::create_dir_all(env.home().join(".config/nvim/lua")).unwrap();
        fs::write(env.home().join(".config/nvim/init.lua"), "-- v1").unwrap();
        fs::write(env.home().join(".config/nvim/lua/opts.lua"), "-- opts").unwrap();
        let spec = hooked("nvim", ".config/nvim", env.store.path().join("nvim"));
        let record = detect(&env, vec![spec], true);
        assert!(!record.is_changed(".config/nvim"));
    }

    #[test]
    fn specs_without_hooks_are_not_recorded() {
        let env = TestEnv::new();
        let src = env.store_file("a", "a");
        let record = detect(&env, vec![FileSpec::new("a", ".a", src)], false);
        assert!(record.is_empty());
    }
}

//! Activate command implementation.
use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use super::{CommandRunner, base_settings, load_config, version};
use crate::cli::{ActivateOpts, GlobalOpts};
use crate::logging::{Log as _, Logger};
use crate::tasks;

/// Run the activate command: stage the new generation and switch the home
/// directory from the old generation to it.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded or any stage fails.
pub fn run(
    global: &GlobalOpts,
    opts: &ActivateOpts,
    log: &Arc<Logger>,
    interrupted: Arc<AtomicBool>,
) -> Result<()> {
    log.info(&format!("homegen {}", version::version()));
    let config = load_config(&opts.manifest, log)?;
    let settings = base_settings(global)?
        .with_new_root(&opts.new_root)?
        .with_old_root(opts.old_root.as_deref())?;

    let runner = CommandRunner::new(config, settings, global, log, interrupted);
    runner.run(&tasks::all_activate_tasks())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::HashSet;

    use crate::tasks;

    #[test]
    fn activate_tasks_have_unique_names() {
        let tasks = tasks::all_activate_tasks();
        let names: Vec<&str> = tasks.iter().map(|t| t.name()).collect();
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(names.len(), unique.len(), "duplicate stage names: {names:?}");
    }

    #[test]
    fn activate_tasks_contain_every_stage() {
        assert_eq!(tasks::all_activate_tasks().len(), 7);
    }
}

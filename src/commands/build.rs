//! Build command implementation.
use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use super::{CommandRunner, base_settings, load_config};
use crate::cli::{BuildOpts, GlobalOpts};
use crate::logging::{Log as _, Logger};
use crate::tasks;

/// Run the build command: validate the manifest and stage the generation
/// without touching the home directory.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded, targets collide, or
/// staging fails.
pub fn run(
    global: &GlobalOpts,
    opts: &BuildOpts,
    log: &Arc<Logger>,
    interrupted: Arc<AtomicBool>,
) -> Result<()> {
    let config = load_config(&opts.manifest, log)?;
    let settings = base_settings(global)?.with_new_root(&opts.out)?;

    let runner = CommandRunner::new(config, settings, global, log, interrupted);
    runner.run(&tasks::all_build_tasks())?;

    let staged = runner.context().staged()?;
    log.info(&format!(
        "generation ready at {} ({} leaves)",
        staged.root().display(),
        staged.len()
    ));
    Ok(())
}

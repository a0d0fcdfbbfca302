//! Deactivate command implementation.
use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use super::{CommandRunner, base_settings};
use crate::cli::{DeactivateOpts, GlobalOpts};
use crate::config::Config;
use crate::generation::StagedTree;
use crate::logging::Logger;
use crate::tasks::clean::CleanOldGeneration;

/// Run the deactivate command: remove every managed link of a generation by
/// cleaning it against an empty new generation.
///
/// # Errors
///
/// Returns an error if the generation cannot be scanned or a link cannot be
/// removed.
pub fn run(
    global: &GlobalOpts,
    opts: &DeactivateOpts,
    log: &Arc<Logger>,
    interrupted: Arc<AtomicBool>,
) -> Result<()> {
    let settings = base_settings(global)?.with_old_root(Some(&opts.old_root))?;

    let runner = CommandRunner::new(Config::default(), settings, global, log, interrupted);
    runner.context().set_staged(StagedTree::empty());
    runner.run_one(&CleanOldGeneration)
}

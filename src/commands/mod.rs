//! Top-level subcommand orchestration.
pub mod activate;
pub mod build;
pub mod deactivate;
pub mod version;

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::cli::GlobalOpts;
use crate::config::{Config, Settings};
use crate::exec::SystemExecutor;
use crate::logging::{Log, Logger};
use crate::tasks::{self, Context, Task};

/// Resolve the live root from `--home`/`HOMEGEN_HOME`, falling back to `$HOME`.
///
/// # Errors
///
/// Returns an error if neither is set.
pub fn resolve_home(global: &GlobalOpts) -> Result<PathBuf> {
    if let Some(home) = &global.home {
        return Ok(home.clone());
    }
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .context("cannot determine home directory. Use --home or set HOMEGEN_HOME")
}

/// Settings derived from the global options, without generation roots.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined or a path
/// cannot be made absolute.
pub fn base_settings(global: &GlobalOpts) -> Result<Settings> {
    let home = resolve_home(global)?;
    Ok(Settings::new(&home)?
        .with_store_dir(global.store_dir.as_deref())?
        .with_backup(global.backup_ext.clone(), global.backup_overwrite))
}

/// Load the manifest at `path` and log what it declares.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or parsed.
pub fn load_config(path: &Path, log: &Logger) -> Result<Config> {
    log.stage("Loading manifest");
    let config = Config::load(path)?;
    for spec in &config.files {
        log.debug(&format!(
            "{}: {} <- {}",
            spec.name,
            spec.target,
            spec.source.display()
        ));
    }
    log.info(&format!(
        "loaded {} files from {}",
        config.files.len(),
        config.manifest_path.display()
    ));
    Ok(config)
}

/// Shared context plus the logger whose summary is printed at the end.
#[derive(Debug)]
pub struct CommandRunner {
    ctx: Context,
    log: Arc<Logger>,
}

impl CommandRunner {
    /// Build the execution context for one command.
    #[must_use]
    pub fn new(
        config: Config,
        settings: Settings,
        global: &GlobalOpts,
        log: &Arc<Logger>,
        interrupted: Arc<AtomicBool>,
    ) -> Self {
        log.debug(&format!("home: {}", settings.home.display()));
        let ctx = Context::new(
            Arc::new(config),
            Arc::new(settings),
            Arc::clone(log) as Arc<dyn Log>,
            Arc::new(SystemExecutor),
        )
        .with_dry_run(global.dry_run)
        .with_parallel(global.parallel)
        .with_interrupt_flag(interrupted);
        Self {
            ctx,
            log: Arc::clone(log),
        }
    }

    /// The execution context.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.ctx
    }

    /// Run `tasks` as a pipeline and print the summary.
    ///
    /// # Errors
    ///
    /// Returns the first stage error.
    pub fn run(&self, tasks: &[Box<dyn Task>]) -> Result<()> {
        if self.ctx.dry_run {
            self.log.info("dry run: the home directory will not be modified");
        }
        let result = tasks::run_pipeline(tasks, &self.ctx);
        self.log.print_summary();
        result
    }

    /// Run a single stage outside the pipeline and print the summary.
    ///
    /// # Errors
    ///
    /// Returns the stage's error.
    pub fn run_one(&self, task: &dyn Task) -> Result<()> {
        let result = tasks::execute(task, &self.ctx);
        self.log.print_summary();
        result
    }
}

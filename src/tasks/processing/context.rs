//! Shared execution context for pipeline stages.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::{Context as _, Result};

use crate::config::{Config, Settings};
use crate::error::ActivationError;
use crate::exec::Executor;
use crate::generation::StagedTree;
use crate::logging::Log;
use crate::tasks::detect_changes::ChangeRecord;

/// Shared context for stage execution.
///
/// Stages communicate through the context: staging publishes the new tree,
/// change detection publishes the change record.
pub struct Context {
    /// The loaded manifest.
    pub config: Arc<Config>,
    /// Roots and policies for this run.
    pub settings: Arc<Settings>,
    /// Logger for output and stage recording.
    pub log: Arc<dyn Log>,
    /// Whether to preview changes without touching the live root.
    pub dry_run: bool,
    /// Whether read-only comparisons may use the rayon pool.
    pub parallel: bool,
    /// Command executor for change hooks.
    pub executor: Arc<dyn Executor>,
    /// Set by the interrupt handler; checked before every live mutation.
    pub interrupted: Arc<AtomicBool>,
    staged: RwLock<Option<Arc<StagedTree>>>,
    changes: RwLock<ChangeRecord>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("settings", &self.settings)
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("parallel", &self.parallel)
            .field("executor", &self.executor)
            .field("interrupted", &self.interrupted)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Create a context with dry-run and parallelism off.
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        settings: Arc<Settings>,
        log: Arc<dyn Log>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            config,
            settings,
            log,
            dry_run: false,
            parallel: false,
            executor,
            interrupted: Arc::new(AtomicBool::new(false)),
            staged: RwLock::new(None),
            changes: RwLock::new(ChangeRecord::default()),
        }
    }

    /// Set dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Allow read-only stages to use the rayon pool.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Share an interrupt flag with a signal handler.
    #[must_use]
    pub fn with_interrupt_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupted = flag;
        self
    }

    /// Fail with [`ActivationError::Interrupted`] if an interrupt arrived.
    ///
    /// # Errors
    ///
    /// Returns an error once the interrupt flag is set.
    pub fn check_interrupted(&self) -> Result<(), ActivationError> {
        if self.interrupted.load(Ordering::SeqCst) {
            Err(ActivationError::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Publish the new generation's tree.
    pub fn set_staged(&self, tree: StagedTree) {
        *self
            .staged
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(tree));
    }

    /// The new generation's tree.
    ///
    /// # Errors
    ///
    /// Returns an error if no stage has published a tree yet.
    pub fn staged(&self) -> Result<Arc<StagedTree>> {
        self.staged
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .context("the new generation has not been staged")
    }

    /// Publish the change record.
    pub fn set_changes(&self, record: ChangeRecord) {
        *self
            .changes
            .write()
            .unwrap_or_else(PoisonError::into_inner) = record;
    }

    /// A copy of the change record.
    #[must_use]
    pub fn changes(&self) -> ChangeRecord {
        self.changes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

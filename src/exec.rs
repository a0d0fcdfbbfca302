//! Process execution for change hooks.
use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, Output};

/// Result of a command execution.
#[derive(Debug)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the process exited successfully.
    pub success: bool,
    /// Exit code, if the process was not killed by a signal.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Abstraction over process execution so hook stages can be tested without
/// spawning real shells.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run `script` with `sh -c` in `dir`, adding `env` to the inherited
    /// environment. A non-zero exit is reported through
    /// [`ExecResult::success`], not as an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell cannot be spawned.
    fn run_shell(&self, dir: &Path, script: &str, env: &[(&str, &str)]) -> Result<ExecResult>;
}

/// Production [`Executor`] that spawns `sh`.
#[derive(Debug, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run_shell(&self, dir: &Path, script: &str, env: &[(&str, &str)]) -> Result<ExecResult> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script).current_dir(dir);
        for (k, v) in env {
            cmd.env(k, v);
        }
        let output = cmd
            .output()
            .with_context(|| format!("failed to execute: sh -c in {}", dir.display()))?;
        Ok(ExecResult::from(output))
    }
}

//! Stage: run `on_change` hooks for targets that changed.
use anyhow::Result;

use super::link::LinkNewGeneration;
use super::{Context, Task, TaskResult, task_deps};
use crate::error::ActivationError;
use crate::exec::ExecResult;

/// Run each changed target's hook with `sh -c` in the live root.
///
/// Every hook is attempted; failures are collected and reported together.
#[derive(Debug)]
pub struct RunChangeHooks;

impl Task for RunChangeHooks {
    fn name(&self) -> &'static str {
        "Run change hooks"
    }

    task_deps![LinkNewGeneration];

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.config.files.iter().any(|s| s.has_hook())
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let changes = ctx.changes();
        let due: Vec<_> = ctx
            .config
            .files
            .iter()
            .filter(|s| s.has_hook() && changes.is_changed(&s.target))
            .collect();
        if due.is_empty() {
            return Ok(TaskResult::Skipped("no hooked target changed".to_string()));
        }

        if ctx.dry_run {
            for spec in &due {
                ctx.log.dry_run(&format!(
                    "would run hook for {}: {}",
                    spec.target, spec.on_change
                ));
            }
            return Ok(TaskResult::DryRun);
        }

        let home = ctx.settings.home.as_path();
        let mut failed = Vec::new();
        for spec in due {
            ctx.log.info(&format!("running hook for {}", spec.target));
            let env = [
                ("HOMEGEN_TARGET", spec.target.as_str()),
                ("HOMEGEN_DRY_RUN", "0"),
            ];
            match ctx.executor.run_shell(home, &spec.on_change, &env) {
                Ok(result) => {
                    relay_output(ctx, &result);
                    if !result.success {
                        ctx.log.error(&format!(
                            "hook for {} exited with {}",
                            spec.target,
                            result
                                .code
                                .map_or_else(|| "a signal".to_string(), |c| format!("code {c}"))
                        ));
                        failed.push(spec.target.clone());
                    }
                }
                Err(e) => {
                    ctx.log
                        .error(&format!("hook for {} could not start: {e:#}", spec.target));
                    failed.push(spec.target.clone());
                }
            }
        }

        if failed.is_empty() {
            Ok(TaskResult::Ok)
        } else {
            Err(ActivationError::HooksFailed { targets: failed }.into())
        }
    }
}

fn relay_output(ctx: &Context, result: &ExecResult) {
    for line in result.stdout.lines() {
        ctx.log.info(line);
    }
    for line in result.stderr.lines() {
        ctx.log.warn(line);
    }
}

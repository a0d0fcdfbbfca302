//! `homegen` command-line entry point.
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

use homegen::cli::{Cli, Command};
use homegen::commands;
use homegen::logging::{self, Log as _};

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    let command = match &args.command {
        Command::Activate(_) => "activate",
        Command::Build(_) => "build",
        Command::Deactivate(_) => "deactivate",
        Command::Version => {
            commands::version::run();
            return ExitCode::SUCCESS;
        }
    };

    logging::init_subscriber(args.verbose, command);
    let log = Arc::new(logging::Logger::new(command));

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        log.warn(&format!("cannot install interrupt handler: {e}"));
    }

    let result = match &args.command {
        Command::Activate(opts) => commands::activate::run(&args.global, opts, &log, interrupted),
        Command::Build(opts) => commands::build::run(&args.global, opts, &log, interrupted),
        Command::Deactivate(opts) => {
            commands::deactivate::run(&args.global, opts, &log, interrupted)
        }
        Command::Version => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Stage failures were already logged by the pipeline.
            if log.failure_count() == 0 {
                log.error(&format!("{e:#}"));
            }
            ExitCode::FAILURE
        }
    }
}

//! Generation-based home directory file reconciler.
//!
//! Builds an immutable *generation* of home files from a declarative
//! manifest, then moves the live home directory from the previous generation
//! to the new one without ever leaving a managed path missing, and without
//! overwriting files it does not manage.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: load the manifest, validate targets, runtime settings
//! - **[`generation`]**: stage a generation root and index its leaves
//! - **[`resources`]**: idempotent `check + apply` primitives for live paths
//! - **[`tasks`]**: named, dependency-ordered pipeline stages
//! - **[`commands`]**: subcommand orchestration (`activate`, `build`, `deactivate`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

#[cfg(not(unix))]
compile_error!("homegen supports unix platforms only");

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod generation;
pub mod logging;
pub mod resources;
pub mod tasks;

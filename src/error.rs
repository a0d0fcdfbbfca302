//! Domain-specific error types for the activation engine.
//!
//! Internal modules return typed errors (e.g., [`ConfigError`],
//! [`StageError`]) wrapped in [`anyhow::Error`]; callers that need to react
//! to a specific failure recover it with `downcast_ref`.
//!
//! # Error hierarchy
//!
//! ```text
//! HomegenError
//! ├── Config(ConfigError)           manifest loading, target collisions
//! ├── Stage(StageError)             building the new generation
//! ├── Activation(ActivationError)   checking, cleaning, linking, hooks
//! └── Task(TaskError)               pipeline ordering
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the activation engine.
#[derive(Error, Debug)]
pub enum HomegenError {
    /// Configuration-related error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Failure while building the staged tree.
    #[error("Staging error: {0}")]
    Stage(#[from] StageError),

    /// Failure while transitioning the live root.
    #[error("Activation error: {0}")]
    Activation(#[from] ActivationError),

    /// Pipeline ordering or execution error.
    #[error("Task execution error: {0}")]
    Task(#[from] TaskError),
}

/// Errors that arise from manifest loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Two or more enabled file specs share a target path.
    #[error("Conflicting managed target files: {}", targets.join(", "))]
    DuplicateTargets {
        /// Every duplicated target, sorted.
        targets: Vec<String>,
    },

    /// The manifest could not be deserialized.
    #[error("Invalid manifest {file}: {message}")]
    InvalidManifest {
        /// Path of the manifest.
        file: String,
        /// Parser message.
        message: String,
    },

    /// An I/O error occurred while reading the manifest.
    #[error("IO error reading manifest {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise while building a new generation.
#[derive(Error, Debug)]
pub enum StageError {
    /// A target resolves outside the staged root.
    #[error("Error installing file '{target}' outside the generation root")]
    PathEscape {
        /// The offending target, as declared.
        target: String,
    },

    /// A declared source does not exist.
    #[error("Source for '{target}' does not exist: {}", source_path.display())]
    SourceMissing {
        /// Declared target.
        target: String,
        /// Missing source path.
        source_path: PathBuf,
    },

    /// The requested generation root already holds a different tree.
    #[error("Generation root {} already exists with different contents", root.display())]
    GenerationExists {
        /// The requested root.
        root: PathBuf,
    },
}

/// Errors that arise while activating a generation against the live root.
#[derive(Error, Debug)]
pub enum ActivationError {
    /// Unmanaged files would be overwritten.
    #[error("Existing file(s) would be clobbered: {}", display_paths(paths))]
    WouldClobber {
        /// Every offending live path.
        paths: Vec<PathBuf>,
    },

    /// Moving an unmanaged file to its backup path failed.
    #[error("Moving '{}' to '{}' failed: {source}", path.display(), backup.display())]
    BackupFailed {
        /// The live path being backed up.
        path: PathBuf,
        /// The backup destination.
        backup: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A non-empty real directory sits where a link must go.
    #[error("Refusing to replace non-empty directory: {}", .0.display())]
    NonEmptyDirectory(PathBuf),

    /// The activation was interrupted between two live mutations.
    #[error("Activation interrupted")]
    Interrupted,

    /// One or more change hooks exited unsuccessfully.
    #[error("Change hook(s) failed for: {}", targets.join(", "))]
    HooksFailed {
        /// Targets whose hooks failed.
        targets: Vec<String>,
    },
}

/// Errors that arise from pipeline ordering.
#[derive(Error, Debug)]
pub enum TaskError {
    /// The stage dependency graph contains a cycle.
    #[error("Task dependency cycle detected: {0}")]
    DependencyCycle(String),

    /// A declared predecessor is not part of the pipeline.
    #[error("Required dependency of '{0}' not found")]
    MissingDependency(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn duplicate_targets_display() {
        let e = ConfigError::DuplicateTargets {
            targets: vec!["c".to_string()],
        };
        assert_eq!(e.to_string(), "Conflicting managed target files: c");
    }

    #[test]
    fn duplicate_targets_display_lists_all() {
        let e = ConfigError::DuplicateTargets {
            targets: vec![".bashrc".to_string(), ".profile".to_string()],
        };
        assert_eq!(
            e.to_string(),
            "Conflicting managed target files: .bashrc, .profile"
        );
    }

    #[test]
    fn config_error_io_has_source() {
        use std::error::Error as StdError;
        let e = ConfigError::Io {
            path: "/etc/home.toml".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("/etc/home.toml"));
    }

    #[test]
    fn path_escape_display() {
        let e = StageError::PathEscape {
            target: "../evil".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Error installing file '../evil' outside the generation root"
        );
    }

    #[test]
    fn would_clobber_lists_paths() {
        let e = ActivationError::WouldClobber {
            paths: vec![PathBuf::from("/home/u/.a"), PathBuf::from("/home/u/.b")],
        };
        assert_eq!(
            e.to_string(),
            "Existing file(s) would be clobbered: /home/u/.a, /home/u/.b"
        );
    }

    #[test]
    fn backup_failed_mentions_both_paths() {
        let e = ActivationError::BackupFailed {
            path: PathBuf::from("/home/u/.foo"),
            backup: PathBuf::from("/home/u/.foo.bak"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = e.to_string();
        assert!(msg.contains("/home/u/.foo'"));
        assert!(msg.contains("/home/u/.foo.bak"));
    }

    #[test]
    fn hooks_failed_display() {
        let e = ActivationError::HooksFailed {
            targets: vec![".xinitrc".to_string()],
        };
        assert_eq!(e.to_string(), "Change hook(s) failed for: .xinitrc");
    }

    #[test]
    fn homegen_error_from_stage_error() {
        let e: HomegenError = StageError::GenerationExists {
            root: PathBuf::from("/gen/2"),
        }
        .into();
        assert!(e.to_string().starts_with("Staging error"));
    }

    #[test]
    fn typed_error_survives_anyhow_round_trip() {
        let err: anyhow::Error = ActivationError::Interrupted.into();
        assert!(matches!(
            err.downcast_ref::<ActivationError>(),
            Some(ActivationError::Interrupted)
        ));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<HomegenError>();
        assert_send_sync::<ConfigError>();
        assert_send_sync::<StageError>();
        assert_send_sync::<ActivationError>();
        assert_send_sync::<TaskError>();
    }
}

//! Manifest loading, validation, and runtime settings.
pub mod loader;
pub mod manifest;
pub mod settings;
pub mod validation;

use anyhow::Result;
use std::path::{Path, PathBuf};

pub use manifest::{Executable, FileSpec};
pub use settings::Settings;

/// A loaded manifest.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Path the manifest was read from.
    pub manifest_path: PathBuf,
    /// Enabled file specs, sorted by name.
    pub files: Vec<FileSpec>,
}

impl Config {
    /// Load the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let manifest_path = settings::absolutize(path)?;
        let files = manifest::load(&manifest_path)?;
        Ok(Self {
            manifest_path,
            files,
        })
    }

    /// Build a config directly from specs, sorting them by name.
    #[must_use]
    pub fn from_specs(mut files: Vec<FileSpec>) -> Self {
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            manifest_path: PathBuf::new(),
            files,
        }
    }
}

/// Shared helpers for config unit tests.
#[cfg(test)]
pub mod test_helpers {
    use std::path::PathBuf;

    /// Write `content` to `file_name` inside a fresh temp directory.
    #[allow(clippy::expect_used)]
    pub fn write_temp_manifest(file_name: &str, content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(file_name);
        std::fs::write(&path, content).expect("write manifest");
        (dir, path)
    }
}

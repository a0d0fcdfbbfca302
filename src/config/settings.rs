//! Runtime settings shared by every stage.
use anyhow::{Context as _, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::generation::paths::lexical_absolute;

/// Filesystem locations and policies for one run.
///
/// All paths are absolute.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// The live root (normally `$HOME`).
    pub home: PathBuf,
    /// Root of the generation being activated, if any.
    pub new_root: Option<PathBuf>,
    /// Root of the currently active generation, if any.
    pub old_root: Option<PathBuf>,
    /// Store directory whose links also count as managed.
    pub store_dir: Option<PathBuf>,
    /// Backup extension; `None` disables backups.
    pub backup_ext: Option<String>,
    /// Overwrite an existing backup instead of refusing.
    pub backup_overwrite: bool,
}

impl Settings {
    /// Create settings for `home` with every option off.
    ///
    /// # Errors
    ///
    /// Returns an error if `home` cannot be made absolute.
    pub fn new(home: &Path) -> Result<Self> {
        Ok(Self {
            home: absolutize(home)?,
            ..Self::default()
        })
    }

    /// Set the generation being activated.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` cannot be made absolute.
    pub fn with_new_root(mut self, root: &Path) -> Result<Self> {
        self.new_root = Some(absolutize(root)?);
        Ok(self)
    }

    /// Set the currently active generation.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` cannot be made absolute.
    pub fn with_old_root(mut self, root: Option<&Path>) -> Result<Self> {
        self.old_root = root.map(absolutize).transpose()?;
        Ok(self)
    }

    /// Set the store directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` cannot be made absolute.
    pub fn with_store_dir(mut self, dir: Option<&Path>) -> Result<Self> {
        self.store_dir = dir.map(absolutize).transpose()?;
        Ok(self)
    }

    /// Set the backup policy. An empty extension disables backups.
    #[must_use]
    pub fn with_backup(mut self, ext: Option<String>, overwrite: bool) -> Self {
        self.backup_ext = ext.filter(|e| !e.is_empty());
        self.backup_overwrite = overwrite;
        self
    }

    /// Root of the generation being activated.
    ///
    /// # Errors
    ///
    /// Returns an error if no new generation was configured.
    pub fn new_root(&self) -> Result<&Path> {
        self.new_root
            .as_deref()
            .context("no new generation root configured")
    }

    /// Locations whose links are considered managed by this tool.
    #[must_use]
    pub fn managed_roots(&self) -> Vec<&Path> {
        [&self.old_root, &self.new_root, &self.store_dir]
            .into_iter()
            .filter_map(Option::as_deref)
            .collect()
    }

    /// The backup path for `live`, or `None` when backups are disabled.
    #[must_use]
    pub fn backup_path(&self, live: &Path) -> Option<PathBuf> {
        let ext = self.backup_ext.as_deref()?;
        let mut name = OsString::from(live.as_os_str());
        name.push(".");
        name.push(ext);
        Some(PathBuf::from(name))
    }
}

/// Make `path` absolute against the current directory and collapse `.` and
/// `..` without touching the filesystem.
///
/// # Errors
///
/// Returns an error if `path` is empty or the current directory is unknown.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    let absolute =
        std::path::absolute(path).with_context(|| format!("resolving path: {}", path.display()))?;
    Ok(lexical_absolute(&absolute))
}

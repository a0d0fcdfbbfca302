//! Link from the live root into the new generation.
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use super::helpers::fs::{ensure_parent_dir, is_empty_dir, replace_with_symlink};
use super::{Resource, ResourceState};
use crate::error::ActivationError;
use crate::generation::content::same_content;

/// A live path that should be a symlink to its staged counterpart.
#[derive(Debug, Clone)]
pub struct HomeLinkResource {
    /// Path relative to both roots.
    pub rel: PathBuf,
    /// Path in the live root.
    pub live: PathBuf,
    /// Path in the new generation (what the link points to).
    pub staged: PathBuf,
    /// Where an unmanaged file is moved before linking; `None` disables
    /// backups.
    pub backup: Option<PathBuf>,
}

impl HomeLinkResource {
    /// Create a link resource for `rel` between `home` and `new_root`.
    #[must_use]
    pub fn new(rel: &Path, home: &Path, new_root: &Path, backup: Option<PathBuf>) -> Self {
        Self {
            rel: rel.to_path_buf(),
            live: home.join(rel),
            staged: new_root.join(rel),
            backup,
        }
    }

    fn back_up(&self, backup: &Path) -> Result<()> {
        fs::rename(&self.live, backup).map_err(|source| ActivationError::BackupFailed {
            path: self.live.clone(),
            backup: backup.to_path_buf(),
            source,
        })?;
        Ok(())
    }
}

impl Resource for HomeLinkResource {
    fn description(&self) -> String {
        format!("{} -> {}", self.live.display(), self.staged.display())
    }

    fn current_state(&self) -> Result<ResourceState> {
        let Ok(meta) = self.live.symlink_metadata() else {
            return Ok(ResourceState::Missing);
        };

        if meta.is_symlink() {
            let existing = fs::read_link(&self.live)?;
            return Ok(if existing == self.staged {
                ResourceState::Correct
            } else {
                ResourceState::Incorrect {
                    current: format!("points to {}", existing.display()),
                }
            });
        }

        if self.backup.is_some() {
            return Ok(ResourceState::Incorrect {
                current: "unmanaged file, will be backed up".to_string(),
            });
        }
        if same_content(&self.live, &self.staged) {
            return Ok(ResourceState::Correct);
        }
        Ok(ResourceState::Incorrect {
            current: if meta.is_dir() {
                "real directory".to_string()
            } else {
                "unmanaged file".to_string()
            },
        })
    }

    fn apply(&self) -> Result<()> {
        if let Ok(meta) = self.live.symlink_metadata()
            && !meta.is_symlink()
        {
            if let Some(backup) = &self.backup {
                self.back_up(backup)?;
            } else if meta.is_dir() && !is_empty_dir(&self.live) {
                return Err(ActivationError::NonEmptyDirectory(self.live.clone()).into());
            }
        }

        ensure_parent_dir(&self.live)?;
        replace_with_symlink(&self.staged, &self.live)?;
        Ok(())
    }
}

//! In-memory index of a staged generation.
use anyhow::{Context as _, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::content::same_content;
use crate::resources::helpers::fs::is_executable;

/// One leaf of a staged generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagedEntry {
    /// A symlink into the store.
    Link {
        /// The link's target, exactly as stored.
        points_to: PathBuf,
    },
    /// A copied regular file.
    File {
        /// Whether any execute bit is set.
        executable: bool,
    },
}

/// A generation root and its leaves, keyed by path relative to the root.
///
/// Directories are not leaves. A tree is never modified once built.
#[derive(Debug, Clone, Default)]
pub struct StagedTree {
    root: PathBuf,
    entries: BTreeMap<PathBuf, StagedEntry>,
}

impl StagedTree {
    /// A tree with no root and no leaves.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Index every leaf under `root` without following symlinks.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` or any entry below it cannot be read.
    pub fn scan(root: &Path) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for entry in WalkDir::new(root).follow_links(false).min_depth(1) {
            let entry = entry.with_context(|| format!("scanning {}", root.display()))?;
            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(root)
                .with_context(|| format!("entry outside root: {}", entry.path().display()))?
                .to_path_buf();
            let staged = if file_type.is_symlink() {
                let points_to = std::fs::read_link(entry.path())
                    .with_context(|| format!("reading link {}", entry.path().display()))?;
                StagedEntry::Link { points_to }
            } else {
                let meta = entry
                    .metadata()
                    .with_context(|| format!("stat {}", entry.path().display()))?;
                StagedEntry::File {
                    executable: is_executable(&meta),
                }
            };
            entries.insert(rel, staged);
        }
        Ok(Self {
            root: root.to_path_buf(),
            entries,
        })
    }

    /// The generation root (empty for [`StagedTree::empty`]).
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of `rel` inside this generation.
    #[must_use]
    pub fn path_of(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }

    /// Iterate leaves in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &StagedEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_path(), v))
    }

    /// The entry at `rel`, if it is a leaf.
    #[must_use]
    pub fn get(&self, rel: &Path) -> Option<&StagedEntry> {
        self.entries.get(rel)
    }

    /// Number of leaves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tree has no leaves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `rel` is provided by this generation.
    ///
    /// True for leaves, and for paths reachable through a leaf that links to a
    /// directory.
    #[must_use]
    pub fn contains(&self, rel: &Path) -> bool {
        if self.entries.contains_key(rel) {
            return true;
        }
        rel.ancestors()
            .skip(1)
            .filter(|a| !a.as_os_str().is_empty())
            .any(|ancestor| {
                matches!(self.entries.get(ancestor), Some(StagedEntry::Link { .. }))
                    && self.path_of(rel).symlink_metadata().is_ok()
            })
    }

    /// Whether `other` has the same leaves, link targets, file bytes, and
    /// executable bits.
    #[must_use]
    pub fn same_layout(&self, other: &Self) -> bool {
        self.entries == other.entries
            && self.entries.iter().all(|(rel, entry)| match entry {
                StagedEntry::Link { .. } => true,
                StagedEntry::File { .. } => same_content(&self.path_of(rel), &other.path_of(rel)),
            })
    }
}

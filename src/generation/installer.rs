//! Building a generation root from file specs.
use anyhow::{Context as _, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::paths::staged_path;
use super::tree::StagedTree;
use crate::config::FileSpec;
use crate::error::StageError;
use crate::logging::Log;
use crate::resources::helpers::fs::{
    create_symlink, ensure_parent_dir, exists_no_follow, is_executable, set_executable,
};

/// Places file specs into a generation root.
#[derive(Debug)]
pub struct FileInstaller {
    root: PathBuf,
}

impl FileInstaller {
    /// Create an installer writing below `root`.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Install `spec` into the root.
    ///
    /// An entry that already exists at the target is left alone and reported
    /// as a conflict warning.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::PathEscape`] if the target leaves the root,
    /// [`StageError::SourceMissing`] if the source does not exist, or an I/O
    /// error if the tree cannot be written.
    pub fn insert(&self, spec: &FileSpec, log: &dyn Log) -> Result<()> {
        let dest = staged_path(&self.root, &spec.target)?;
        let meta = match fs::metadata(&spec.source) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StageError::SourceMissing {
                    target: spec.target.clone(),
                    source_path: spec.source.clone(),
                }
                .into());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("stat {}", spec.source.display()));
            }
        };

        if meta.is_dir() && spec.recursive {
            if exists_no_follow(&dest) && !is_real_dir(&dest) {
                log.warn(&format!("File conflict for file '{}'", spec.target));
                return Ok(());
            }
            fs::create_dir_all(&dest).with_context(|| format!("mkdir {}", dest.display()))?;
            return mirror(spec, &dest, log);
        }

        if exists_no_follow(&dest) {
            log.warn(&format!("File conflict for file '{}'", spec.target));
            return Ok(());
        }
        ensure_parent_dir(&dest)?;

        if meta.is_dir() {
            return create_symlink(&spec.source, &dest);
        }

        let source_bit = is_executable(&meta);
        let wanted = spec.executable.resolve(source_bit);
        if wanted == source_bit {
            return create_symlink(&spec.source, &dest);
        }
        fs::copy(&spec.source, &dest)
            .with_context(|| format!("copy {} to {}", spec.source.display(), dest.display()))?;
        set_executable(&dest, wanted)
    }
}

/// Mirror a directory source: real directories, one link per leaf.
fn mirror(spec: &FileSpec, dest_root: &Path, log: &dyn Log) -> Result<()> {
    let mut walker = WalkDir::new(&spec.source)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.with_context(|| format!("walking {}", spec.source.display()))?;
        let rel = entry
            .path()
            .strip_prefix(&spec.source)
            .with_context(|| format!("entry outside source: {}", entry.path().display()))?;
        let dest = dest_root.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            if exists_no_follow(&dest) && !is_real_dir(&dest) {
                log.warn(&format!(
                    "File conflict for file '{}'",
                    Path::new(&spec.target).join(rel).display()
                ));
                walker.skip_current_dir();
                continue;
            }
            fs::create_dir_all(&dest).with_context(|| format!("mkdir {}", dest.display()))?;
            continue;
        }
        if file_type.is_symlink() && spec.ignorelinks {
            continue;
        }
        if exists_no_follow(&dest) {
            log.warn(&format!(
                "File conflict for file '{}'",
                Path::new(&spec.target).join(rel).display()
            ));
            continue;
        }
        create_symlink(entry.path(), &dest)?;
    }
    Ok(())
}

fn is_real_dir(path: &Path) -> bool {
    path.symlink_metadata().is_ok_and(|m| m.is_dir())
}

/// Hidden sibling directory in which a generation is assembled.
fn build_dir_for(root: &Path) -> PathBuf {
    let name = root
        .file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
    root.with_file_name(format!(".{name}.homegen-build-{}", std::process::id()))
}

fn populate(build_dir: &Path, specs: &[FileSpec], log: &dyn Log) -> Result<StagedTree> {
    let installer = FileInstaller::new(build_dir);
    for spec in specs {
        installer
            .insert(spec, log)
            .with_context(|| format!("installing '{}'", spec.name))?;
    }
    StagedTree::scan(build_dir)
}

/// Build the generation for `specs` at `root`.
///
/// The tree is assembled in a hidden sibling directory first. If `root` does
/// not exist the build is renamed onto it. If it exists with an identical
/// layout it is reused; otherwise the build is discarded and
/// [`StageError::GenerationExists`] is returned.
///
/// # Errors
///
/// Returns an error if any spec cannot be installed, if `root` holds a
/// different generation, or on I/O failure.
pub fn build_generation(specs: &[FileSpec], root: &Path, log: &dyn Log) -> Result<StagedTree> {
    if let Some(parent) = root.parent() {
        fs::create_dir_all(parent).with_context(|| format!("mkdir {}", parent.display()))?;
    }
    let build_dir = build_dir_for(root);
    if exists_no_follow(&build_dir) {
        fs::remove_dir_all(&build_dir)
            .with_context(|| format!("removing stale build {}", build_dir.display()))?;
    }
    fs::create_dir(&build_dir).with_context(|| format!("mkdir {}", build_dir.display()))?;

    let built = match populate(&build_dir, specs, log) {
        Ok(tree) => tree,
        Err(e) => {
            let _ = fs::remove_dir_all(&build_dir);
            return Err(e);
        }
    };

    if exists_no_follow(root) {
        let existing = StagedTree::scan(root);
        let _ = fs::remove_dir_all(&build_dir);
        let existing = existing?;
        if existing.same_layout(&built) {
            log.debug(&format!("reusing identical generation at {}", root.display()));
            return Ok(existing);
        }
        return Err(StageError::GenerationExists {
            root: root.to_path_buf(),
        }
        .into());
    }

    fs::rename(&build_dir, root)
        .with_context(|| format!("rename {} to {}", build_dir.display(), root.display()))?;
    log.debug(&format!("staged {} leaves at {}", built.len(), root.display()));
    StagedTree::scan(root)
}

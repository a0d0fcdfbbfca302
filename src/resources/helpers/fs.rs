//! File-system resource helpers.
use anyhow::{Context as _, Result};
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt as _;
use std::path::{Path, PathBuf};

/// Mode bits for user, group, and other execute permission.
const EXEC_BITS: u32 = 0o111;

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    Ok(())
}

/// Create a symlink at `link` pointing to `target`.
///
/// # Errors
///
/// Returns an error if the link cannot be created (e.g. `link` exists).
pub fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, link).with_context(|| {
        format!(
            "creating symlink {} -> {}",
            link.display(),
            target.display()
        )
    })
}

/// Whether anything (including a dangling symlink) exists at `path`.
#[must_use]
pub fn exists_no_follow(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Whether any execute bit is set on `meta`.
#[must_use]
pub fn is_executable(meta: &fs::Metadata) -> bool {
    meta.permissions().mode() & EXEC_BITS != 0
}

/// Force the execute bits of `path` on or off, leaving other bits alone.
///
/// When turning execution on, each class gets the bit only if it can read.
///
/// # Errors
///
/// Returns an error if the permissions cannot be read or written.
pub fn set_executable(path: &Path, executable: bool) -> Result<()> {
    let meta = fs::metadata(path).with_context(|| format!("stat: {}", path.display()))?;
    let mode = meta.permissions().mode();
    let new_mode = if executable {
        mode | ((mode & 0o444) >> 2)
    } else {
        mode & !EXEC_BITS
    };
    fs::set_permissions(path, fs::Permissions::from_mode(new_mode))
        .with_context(|| format!("chmod: {}", path.display()))
}

/// Hidden sibling path used while atomically replacing `path`.
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.homegen-tmp-{}", std::process::id()))
}

/// Atomically put a symlink to `target` at `link`.
///
/// The new link is created at a hidden sibling and renamed over `link`, so
/// `link` never disappears while being replaced. An empty real directory at
/// `link` is removed first; a non-empty one is reported as
/// [`io::ErrorKind::DirectoryNotEmpty`].
///
/// # Errors
///
/// Returns an error if the link cannot be created or renamed into place.
pub fn replace_with_symlink(target: &Path, link: &Path) -> Result<()> {
    if let Ok(meta) = link.symlink_metadata()
        && meta.is_dir()
    {
        fs::remove_dir(link).with_context(|| format!("remove directory: {}", link.display()))?;
    }

    let tmp = temp_sibling(link);
    if exists_no_follow(&tmp) {
        fs::remove_file(&tmp).with_context(|| format!("remove stale: {}", tmp.display()))?;
    }
    create_symlink(target, &tmp)?;
    if let Err(e) = fs::rename(&tmp, link) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("rename {} to {}", tmp.display(), link.display()));
    }
    Ok(())
}

/// Whether `dir` is a real directory with no entries.
#[must_use]
pub fn is_empty_dir(dir: &Path) -> bool {
    dir.symlink_metadata().is_ok_and(|m| m.is_dir())
        && fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_none())
}

/// Remove empty directories from `start` upwards, stopping at `stop` (never
/// removed) or at the first directory that is not empty.
///
/// # Errors
///
/// Returns an error only for failures other than "not empty" or "not found".
pub fn prune_empty_parents(start: &Path, stop: &Path) -> Result<()> {
    let mut current = Some(start);
    while let Some(dir) = current
        && dir != stop
        && dir.starts_with(stop)
    {
        match fs::remove_dir(dir) {
            Ok(()) => {}
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::DirectoryNotEmpty | io::ErrorKind::NotFound
                ) =>
            {
                break;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("remove directory: {}", dir.display()));
            }
        }
        current = dir.parent();
    }
    Ok(())
}

//! Lexical path normalisation and containment checks.
use std::path::{Component, Path, PathBuf};

use crate::error::StageError;

/// Normalise a declared target into a relative path without touching the
/// filesystem.
///
/// Root and `.` components are dropped and `..` pops the previous component.
/// A `..` that would climb above the start is kept so callers can detect the
/// escape.
#[must_use]
pub fn normalize_relative(target: &str) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in Path::new(target).components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                _ => parts.push(component),
            },
            Component::Normal(_) => parts.push(component),
        }
    }
    parts.iter().collect()
}

/// Resolve `target` to its path inside `root`.
///
/// The result must lie strictly within `root`: lexically, and also after
/// resolving the deepest ancestor that already exists, so a directory link
/// staged earlier cannot be used to write outside the root.
///
/// # Errors
///
/// Returns [`StageError::PathEscape`] if the path leaves `root`.
pub fn staged_path(root: &Path, target: &str) -> Result<PathBuf, StageError> {
    let escape = || StageError::PathEscape {
        target: target.to_string(),
    };

    let rel = normalize_relative(target);
    if rel.as_os_str().is_empty() || rel.starts_with("..") {
        return Err(escape());
    }

    let path = root.join(&rel);
    let canonical_root = dunce::canonicalize(root).map_err(|_| escape())?;
    let ancestor = path
        .ancestors()
        .skip(1)
        .find(|p| p.symlink_metadata().is_ok())
        .ok_or_else(escape)?;
    let resolved = dunce::canonicalize(ancestor).map_err(|_| escape())?;
    if resolved.starts_with(&canonical_root) {
        Ok(path)
    } else {
        Err(escape())
    }
}

/// Whether `path` equals `prefix` or lies below it, compared by components.
#[must_use]
pub fn is_under(path: &Path, prefix: &Path) -> bool {
    path.starts_with(prefix)
}

/// Absolutise a symlink's target against the directory holding the link.
#[must_use]
pub fn resolve_link_target(link: &Path, points_to: &Path) -> PathBuf {
    let joined = if points_to.is_absolute() {
        points_to.to_path_buf()
    } else {
        link.parent()
            .map_or_else(|| points_to.to_path_buf(), |dir| dir.join(points_to))
    };
    lexical_absolute(&joined)
}

/// Collapse `.` and `..` in an absolute path without touching the filesystem.
///
/// Every root handed to the pipeline goes through this, so comparisons with
/// resolved link targets see the same spelling.
#[must_use]
pub fn lexical_absolute(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}

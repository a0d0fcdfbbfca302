//! Manifest validation: fatal target collisions and soft warnings.
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use super::manifest::FileSpec;
use crate::error::ConfigError;
use crate::generation::paths::normalize_relative;

/// A non-fatal problem detected in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// Name of the file spec that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    #[must_use]
    fn new(item: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.item, self.message)
    }
}

/// Rejects manifests where two enabled specs share a target.
///
/// Targets are compared after lexical normalisation, so `./a//b` and `a/b`
/// collide.
#[derive(Debug)]
pub struct CollisionValidator<'a> {
    specs: &'a [FileSpec],
}

impl<'a> CollisionValidator<'a> {
    /// Create a validator over `specs`.
    #[must_use]
    pub const fn new(specs: &'a [FileSpec]) -> Self {
        Self { specs }
    }

    /// Every target declared by more than one spec, sorted.
    #[must_use]
    pub fn duplicate_targets(&self) -> Vec<String> {
        let mut counts: BTreeMap<PathBuf, usize> = BTreeMap::new();
        for spec in self.specs {
            *counts.entry(normalize_relative(&spec.target)).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(target, _)| target.display().to_string())
            .collect()
    }

    /// Fail if any target is declared more than once.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateTargets`] listing every duplicated target.
    pub fn check(&self) -> Result<(), ConfigError> {
        let targets = self.duplicate_targets();
        if targets.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::DuplicateTargets { targets })
        }
    }
}

/// Collect soft warnings for `specs`.
///
/// None of these stop an activation on their own; a missing source fails
/// later, at staging.
#[must_use]
pub fn lint(specs: &[FileSpec]) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    for spec in specs {
        if spec.ignorelinks && !spec.recursive {
            warnings.push(ValidationWarning::new(
                &spec.name,
                "ignorelinks has no effect without recursive",
            ));
        }

        match std::fs::metadata(&spec.source) {
            Err(_) => warnings.push(ValidationWarning::new(
                &spec.name,
                format!("source does not exist: {}", spec.source.display()),
            )),
            Ok(meta) if spec.recursive && !meta.is_dir() => {
                warnings.push(ValidationWarning::new(
                    &spec.name,
                    "recursive has no effect on a regular-file source",
                ));
            }
            Ok(_) => {}
        }
    }

    warnings
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;

    fn spec(name: &str, target: &str) -> FileSpec {
        FileSpec::new(name, target, PathBuf::from("/nonexistent"))
    }

    // -----------------------------------------------------------------------
    // CollisionValidator
    // -----------------------------------------------------------------------

    #[test]
    fn distinct_targets_pass() {
        let specs = vec![spec("a", ".a"), spec("b", ".b")];
        assert!(CollisionValidator::new(&specs).check().is_ok());
    }

    #[test]
    fn shared_target_is_the_sole_conflict() {
        let specs = vec![spec("a", "c"), spec("b", "c")];
        let err = CollisionValidator::new(&specs).check().unwrap_err();
        match err {
            ConfigError::DuplicateTargets { targets } => assert_eq!(targets, vec!["c"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn collision_detected_after_normalisation() {
        let specs = vec![spec("a", "./config//app"), spec("b", "config/app")];
        assert_eq!(
            CollisionValidator::new(&specs).duplicate_targets(),
            vec!["config/app"]
        );
    }

    #[test]
    fn all_duplicates_reported_sorted() {
        let specs = vec![
            spec("1", ".z"),
            spec("2", ".z"),
            spec("3", ".a"),
            spec("4", ".a"),
            spec("5", ".m"),
        ];
        assert_eq!(
            CollisionValidator::new(&specs).duplicate_targets(),
            vec![".a", ".z"]
        );
    }

    // -----------------------------------------------------------------------
    // lint
    // -----------------------------------------------------------------------

    #[test]
    fn lint_flags_missing_source_and_ignorelinks() {
        let mut s = spec("dots", ".dots");
        s.ignorelinks = true;
        let warnings = lint(&[s]);
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| w.item == "dots"));
        assert!(warnings[0].message.contains("ignorelinks"));
        assert!(warnings[1].message.contains("does not exist"));
    }

    #[test]
    fn lint_flags_recursive_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, "x").unwrap();
        let mut s = FileSpec::new("f", ".f", file);
        s.recursive = true;
        let warnings = lint(&[s]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].to_string(),
            "f: recursive has no effect on a regular-file source"
        );
    }

    #[test]
    fn lint_clean_spec_has_no_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let s = FileSpec::new("d", ".d", dir.path().to_path_buf());
        assert!(lint(&[s]).is_empty());
    }
}

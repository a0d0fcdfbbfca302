//! File specifications declared in the manifest.
use anyhow::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::loader;

/// Executable-bit policy for a regular-file source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Executable {
    /// Keep whatever bit the source has.
    #[default]
    Inherit,
    /// Force the bit on (`true`) or off (`false`).
    Set(bool),
}

impl Executable {
    /// Resolve the desired bit given the source's current bit.
    #[must_use]
    pub const fn resolve(self, source_bit: bool) -> bool {
        match self {
            Self::Inherit => source_bit,
            Self::Set(bit) => bit,
        }
    }
}

impl From<Option<bool>> for Executable {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::Inherit, Self::Set)
    }
}

/// One declared file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    /// Manifest key; specs are processed in key order.
    pub name: String,
    /// Path relative to the home root, as declared.
    pub target: String,
    /// Immutable content (file or directory), absolute.
    pub source: PathBuf,
    /// Executable-bit policy.
    pub executable: Executable,
    /// Mirror a directory source leaf by leaf instead of linking it whole.
    pub recursive: bool,
    /// With `recursive`, skip source entries that are themselves symlinks.
    pub ignorelinks: bool,
    /// Allow overwriting whatever lives at or below the target.
    pub force: bool,
    /// Shell command run when the target changed; empty means none.
    pub on_change: String,
}

impl FileSpec {
    /// Create a spec with default options.
    #[must_use]
    pub fn new(name: impl Into<String>, target: impl Into<String>, source: PathBuf) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            source,
            executable: Executable::Inherit,
            recursive: false,
            ignorelinks: false,
            force: false,
            on_change: String::new(),
        }
    }

    /// Whether this spec declares a change hook.
    #[must_use]
    pub fn has_hook(&self) -> bool {
        !self.on_change.trim().is_empty()
    }
}

/// Top-level manifest document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestDocument {
    #[serde(default)]
    files: BTreeMap<String, RawFileSpec>,
}

/// A `[files.<name>]` table as written.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFileSpec {
    target: String,
    source: PathBuf,
    #[serde(default)]
    executable: Option<bool>,
    #[serde(default)]
    recursive: bool,
    #[serde(default)]
    ignorelinks: bool,
    #[serde(default)]
    force: bool,
    #[serde(default, alias = "onChange")]
    on_change: String,
    #[serde(default = "enabled_by_default")]
    enable: bool,
}

const fn enabled_by_default() -> bool {
    true
}

/// Load the enabled file specs from the manifest at `path`, sorted by name.
///
/// Relative sources resolve against the manifest's directory.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or parsed.
pub fn load(path: &Path) -> Result<Vec<FileSpec>> {
    let doc: ManifestDocument = loader::load_document(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));

    Ok(doc
        .files
        .into_iter()
        .filter(|(_, raw)| raw.enable)
        .map(|(name, raw)| FileSpec {
            name,
            target: raw.target,
            source: base.join(raw.source),
            executable: raw.executable.into(),
            recursive: raw.recursive,
            ignorelinks: raw.ignorelinks,
            force: raw.force,
            on_change: raw.on_change,
        })
        .collect())
}

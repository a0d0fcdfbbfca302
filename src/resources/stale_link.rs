//! Link left behind by the old generation.
use anyhow::{Context as _, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::helpers::fs::prune_empty_parents;
use super::{Resource, ResourceState};
use crate::generation::paths::{is_under, resolve_link_target};

/// A live path that held an old-generation leaf absent from the new one.
///
/// The desired state is "gone". Only symlinks into a managed location are
/// removed; anything else is left for the user.
#[derive(Debug, Clone)]
pub struct StaleLinkResource {
    /// Path in the live root.
    pub live: PathBuf,
    /// The live root; never removed while pruning.
    pub home: PathBuf,
    /// Locations whose links count as managed.
    pub managed: Vec<PathBuf>,
}

impl StaleLinkResource {
    /// Create a stale-link resource for `rel` under `home`.
    #[must_use]
    pub fn new(rel: &Path, home: &Path, managed: Vec<PathBuf>) -> Self {
        Self {
            live: home.join(rel),
            home: home.to_path_buf(),
            managed,
        }
    }
}

impl Resource for StaleLinkResource {
    fn description(&self) -> String {
        self.live.display().to_string()
    }

    fn current_state(&self) -> Result<ResourceState> {
        let Ok(meta) = self.live.symlink_metadata() else {
            return Ok(ResourceState::Correct);
        };
        if !meta.is_symlink() {
            return Ok(ResourceState::Invalid {
                reason: "not a symlink, leaving it in place".to_string(),
            });
        }

        let points_to = fs::read_link(&self.live)
            .with_context(|| format!("reading link {}", self.live.display()))?;
        let resolved = resolve_link_target(&self.live, &points_to);
        if self.managed.iter().any(|root| is_under(&resolved, root)) {
            Ok(ResourceState::Incorrect {
                current: format!("points to {}", points_to.display()),
            })
        } else {
            Ok(ResourceState::Invalid {
                reason: format!(
                    "points to {} outside any managed location",
                    points_to.display()
                ),
            })
        }
    }

    fn apply(&self) -> Result<()> {
        fs::remove_file(&self.live).with_context(|| format!("remove {}", self.live.display()))?;
        if let Some(parent) = self.live.parent() {
            prune_empty_parents(parent, &self.home)?;
        }
        Ok(())
    }
}

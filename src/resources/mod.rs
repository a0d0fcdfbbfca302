//! Idempotent resource primitives (check + apply pattern).
pub mod helpers;
pub mod home_link;
pub mod stale_link;

use anyhow::Result;

pub use home_link::HomeLinkResource;
pub use stale_link::StaleLinkResource;

/// State of a live path relative to what the activation wants there.
///
/// # Examples
///
/// ```
/// use homegen::resources::ResourceState;
///
/// let missing = ResourceState::Missing;
/// let correct = ResourceState::Correct;
/// let wrong = ResourceState::Incorrect { current: "points to /gen/1/.bashrc".into() };
/// let skip = ResourceState::Invalid { reason: "not a managed link".into() };
///
/// assert_ne!(missing, correct);
/// assert_eq!(correct, ResourceState::Correct);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Nothing exists at the live path.
    Missing,
    /// The live path already matches the desired state.
    Correct,
    /// Something exists but does not match the desired state.
    Incorrect {
        /// Description of what is there now.
        current: String,
    },
    /// The resource must not be touched.
    Invalid {
        /// Reason why the resource cannot be applied.
        reason: String,
    },
}

/// A live path that can be checked and brought into its desired state.
pub trait Resource {
    /// Human-readable description of this resource.
    fn description(&self) -> String;

    /// Check the current state of the resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be determined.
    fn current_state(&self) -> Result<ResourceState>;

    /// Bring the live path into its desired state.
    ///
    /// # Errors
    ///
    /// Returns an error if the live path cannot be changed.
    fn apply(&self) -> Result<()>;

    /// Determine if the resource needs to be changed.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Resource::current_state`].
    fn needs_change(&self) -> Result<bool> {
        Ok(matches!(
            self.current_state()?,
            ResourceState::Missing | ResourceState::Incorrect { .. }
        ))
    }
}

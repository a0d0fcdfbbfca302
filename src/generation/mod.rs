//! Generation roots: staging, indexing, and comparing them.
pub mod content;
pub mod installer;
pub mod paths;
pub mod tree;

pub use installer::{FileInstaller, build_generation};
pub use tree::{StagedEntry, StagedTree};

//! Manifest file parsing (TOML or JSON, chosen by extension).
use anyhow::Result;
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::ConfigError;

/// Serialization format of a manifest file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// TOML document (the default).
    Toml,
    /// JSON document (`.json` extension).
    Json,
}

impl Format {
    /// Pick the format for `path`: `.json` is JSON, anything else is TOML.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

/// Read and deserialize the document at `path`.
///
/// Unlike optional config files, a missing manifest is an error: there is
/// nothing sensible to activate without one.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read and
/// [`ConfigError::InvalidManifest`] if it cannot be parsed.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_document(path, &content)
}

/// Deserialize `content`, using `path` only to pick the format and label errors.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidManifest`] if `content` cannot be parsed.
pub fn parse_document<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T> {
    let parsed = match Format::from_path(path) {
        Format::Toml => toml::from_str(content).map_err(|e| e.message().to_string()),
        Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| {
        ConfigError::InvalidManifest {
            file: path.display().to_string(),
            message,
        }
        .into()
    })
}

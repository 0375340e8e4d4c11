//! User-supplied original names for embedded parts.
//!
//! A mapping file is JSON. A planning run can write one out with
//! `original_name` left empty for the user to fill in.

use crate::error::{Error, Result};
use crate::report::PlannedPart;
use crate::types::bare_name;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One part's mapping entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Full part path inside the container; may be empty to match by `current_name`.
    #[serde(default)]
    pub embedded_path: String,

    /// Description of the detected type, informational only.
    #[serde(default)]
    pub detected_type: String,

    /// Detected extension with a leading dot, informational only.
    #[serde(default)]
    pub detected_extension: String,

    /// Bare part name inside the container.
    #[serde(default)]
    pub current_name: String,

    /// Name to use for the extracted file; empty means no override.
    #[serde(default)]
    pub original_name: String,
}

/// Mapping from part paths to user-chosen names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameMapping {
    /// Container the mapping was generated for, informational only.
    #[serde(default)]
    pub container: String,

    #[serde(default)]
    pub mappings: Vec<MappingEntry>,
}

impl NameMapping {
    /// Parse a mapping from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::MappingError(e.to_string()))
    }

    /// Load a mapping file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .map_err(|e| Error::MappingError(format!("{}: {}", path.display(), e)))?;
        let mapping = Self::from_json(&json)?;
        log::debug!(
            "Loaded name mapping from {} ({} entries)",
            path.display(),
            mapping.mappings.len()
        );
        Ok(mapping)
    }

    /// Write the mapping as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::MappingError(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Build a template from a planning run.
    pub fn template(container: impl Into<String>, parts: &[PlannedPart]) -> Self {
        let mappings = parts
            .iter()
            .map(|part| MappingEntry {
                embedded_path: part.source_path.clone(),
                detected_type: part.detected_type.description.clone(),
                detected_extension: part.detected_type.dotted_extension(),
                current_name: bare_name(&part.source_path).to_string(),
                original_name: String::new(),
            })
            .collect();

        Self {
            container: container.into(),
            mappings,
        }
    }

    /// User-chosen name for a part, if one was filled in.
    ///
    /// Entries are matched on the full part path; entries without a path
    /// match on the bare part name.
    pub fn original_name_for(&self, part_path: &str) -> Option<&str> {
        let filled = |entry: &&MappingEntry| !entry.original_name.trim().is_empty();

        self.mappings
            .iter()
            .filter(filled)
            .find(|entry| entry.embedded_path == part_path)
            .or_else(|| {
                let bare = bare_name(part_path);
                self.mappings
                    .iter()
                    .filter(filled)
                    .find(|entry| entry.embedded_path.is_empty() && entry.current_name == bare)
            })
            .map(|entry| entry.original_name.trim())
    }

    /// Number of entries with a name filled in.
    pub fn filled_count(&self) -> usize {
        self.mappings
            .iter()
            .filter(|entry| !entry.original_name.trim().is_empty())
            .count()
    }
}

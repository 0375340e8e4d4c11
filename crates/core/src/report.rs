//! Structured results of an extraction run.

use crate::error::{Error, ErrorKind};
use crate::types::{DetectedType, FileCategory, NameOrigin};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Outcome for one successfully written part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// Path of the part inside the container.
    pub source_path: String,

    /// Chosen base name, before any collision suffix.
    pub resolved_name: String,

    /// Extension applied to the output file (no leading dot, may be empty).
    pub resolved_extension: String,

    /// Content-derived type.
    pub detected_type: DetectedType,

    /// Number of bytes written.
    pub byte_size: u64,

    /// Which naming source won.
    pub name_origin: NameOrigin,

    /// Final file name, including any collision suffix.
    pub file_name: String,

    /// Where the file was written.
    pub output_path: PathBuf,
}

/// A part that could not be extracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Path of the part inside the container.
    pub source_path: String,

    /// Error category.
    pub kind: ErrorKind,

    /// Error description.
    pub message: String,
}

impl FailureRecord {
    /// Build a failure record from an error.
    pub fn from_error(source_path: impl Into<String>, error: &Error) -> Self {
        Self {
            source_path: source_path.into(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// A degradation that did not stop extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Part the warning is about (a sidecar, a slide, an embedded part).
    pub source: String,

    /// What went wrong.
    pub message: String,
}

impl Warning {
    /// Create a new warning.
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
        }
    }
}

/// A naming decision made without writing anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedPart {
    pub source_path: String,
    pub resolved_name: String,
    pub resolved_extension: String,
    pub detected_type: DetectedType,
    pub byte_size: u64,
    pub name_origin: NameOrigin,
    pub file_name: String,
}

/// Naming decisions for a whole container, nothing written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionPlan {
    pub container: PathBuf,
    pub parts: Vec<PlannedPart>,
    /// Parts that could not be read.
    pub failures: Vec<FailureRecord>,
    pub warnings: Vec<Warning>,
}

impl ExtractionPlan {
    /// Create an empty plan.
    pub fn new(container: impl Into<PathBuf>) -> Self {
        Self {
            container: container.into(),
            parts: Vec::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Everything one run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// The container that was processed.
    pub container: PathBuf,

    /// Directory the files were written to.
    pub target_dir: PathBuf,

    /// Successfully written parts, in scan order.
    pub records: Vec<ExtractionRecord>,

    /// Parts that failed, in scan order.
    pub failures: Vec<FailureRecord>,

    /// Absorbed degradations (malformed sidecars, unreadable slides, ...).
    pub warnings: Vec<Warning>,
}

impl ExtractionReport {
    /// Create an empty report.
    pub fn new(container: impl Into<PathBuf>, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            container: container.into(),
            target_dir: target_dir.into(),
            records: Vec::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Number of parts attempted.
    pub fn total(&self) -> usize {
        self.records.len() + self.failures.len()
    }

    /// Total bytes written.
    pub fn total_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.byte_size).sum()
    }

    /// Whether every attempted part was written.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Records grouped by category, categories in a stable order.
    pub fn by_category(&self) -> BTreeMap<FileCategory, Vec<&ExtractionRecord>> {
        let mut groups: BTreeMap<FileCategory, Vec<&ExtractionRecord>> = BTreeMap::new();
        for record in &self.records {
            groups
                .entry(record.detected_type.category)
                .or_default()
                .push(record);
        }
        groups
    }
}

/// Format a byte count for humans, e.g. `1.5 KB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} B", bytes)
    } else {
        let rounded = (value * 100.0).round() / 100.0;
        format!("{} {}", rounded, UNITS[unit])
    }
}

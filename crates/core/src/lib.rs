//! Core domain types, format registry, naming policy, and reporting
//! for embedded object extraction.

pub mod config;
pub mod error;
pub mod formats;
pub mod mapping;
pub mod naming;
pub mod report;
pub mod types;

pub use config::{ExtractorConfig, HintPrecedence};
pub use error::{Error, ErrorKind, Result};
pub use mapping::{MappingEntry, NameMapping};
pub use naming::{CollisionResolver, NameSources, ResolvedName};
pub use report::{
    ExtractionPlan, ExtractionRecord, ExtractionReport, FailureRecord, PlannedPart, Warning,
};
pub use types::{
    ContainerKind, ContainerPart, DetectedType, DisplayNameHint, FileCategory, HintConfidence,
    NameOrigin, OleDirectoryEntry, Relationship,
};

//! Domain types for representing container parts and what was learned about them.

use serde::{Deserialize, Serialize};

/// A named byte stream inside the outer container.
#[derive(Debug, Clone)]
pub struct ContainerPart {
    /// Full part path inside the container, e.g. `ppt/embeddings/oleObject3.bin`.
    pub path: String,

    /// Raw bytes of the part.
    pub data: Vec<u8>,
}

impl ContainerPart {
    /// Create a part from its path and bytes.
    pub fn new(path: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    /// Size of the part in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Path segments, in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|s| !s.is_empty())
    }

    /// Last path segment.
    pub fn bare_name(&self) -> &str {
        bare_name(&self.path)
    }
}

/// Last segment of a `/`-separated part path.
pub fn bare_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Coarse structural family of a byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContainerKind {
    /// Single-stream binary format (images, media, PDF, executables).
    FlatBinary,
    /// ZIP archive, possibly an Office Open XML document.
    ZipBased,
    /// OLE compound file, possibly a legacy Office document.
    OleCompound,
    /// Plain or rich text.
    Text,
    /// Nothing recognizable.
    Unknown,
}

/// Broad grouping used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileCategory {
    Document,
    Spreadsheet,
    Presentation,
    Image,
    Audio,
    Video,
    Archive,
    Executable,
    Other,
}

impl FileCategory {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            FileCategory::Document => "Documents",
            FileCategory::Spreadsheet => "Spreadsheets",
            FileCategory::Presentation => "Presentations",
            FileCategory::Image => "Images",
            FileCategory::Audio => "Audio",
            FileCategory::Video => "Video",
            FileCategory::Archive => "Archives",
            FileCategory::Executable => "Executables",
            FileCategory::Other => "Other",
        }
    }
}

/// The type of a part as derived from its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedType {
    /// Canonical extension without the leading dot.
    pub extension: String,

    /// Human-readable description.
    pub description: String,

    /// MIME type string.
    pub mime: String,

    /// Structural family.
    pub kind: ContainerKind,

    /// Reporting category.
    pub category: FileCategory,
}

impl DetectedType {
    /// The unknown/binary fallback type.
    pub fn unknown() -> Self {
        crate::formats::builtin("bin")
    }

    /// Plain text.
    pub fn text() -> Self {
        crate::formats::builtin("txt")
    }

    /// Extension with a leading dot.
    pub fn dotted_extension(&self) -> String {
        format!(".{}", self.extension)
    }

    /// Whether the classification carries little evidence about the real format.
    ///
    /// Unknown binaries and compound files without an application marker are weak:
    /// a name recovered elsewhere may know better.
    pub fn is_weak(&self) -> bool {
        match self.kind {
            ContainerKind::Unknown => true,
            ContainerKind::OleCompound => self.extension == "ole",
            _ => false,
        }
    }
}

/// A single relationship from an owning part to a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Relationship ID, unique only within its owner (e.g. "rId3").
    pub id: String,

    /// Target reference exactly as written in the sidecar.
    pub target: String,

    /// Absolute part path of the target; `None` for external targets.
    pub target_path: Option<String>,

    /// Relationship type URI (empty if absent).
    pub rel_type: String,

    /// Path of the part this relationship belongs to ("" for the package root).
    pub owner: String,

    /// Whether the target lies outside the container.
    pub external: bool,
}

/// Confidence rank of a display-name hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HintConfidence {
    /// Name of the visual frame that directly encloses the placeholder.
    EnclosingFrame,
    /// Filename-looking frame name elsewhere on the same slide.
    FilenameLike,
}

/// A human-authored name recovered from slide markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayNameHint {
    /// Relationship ID referenced by the embedded-object placeholder.
    pub rel_id: String,

    /// Slide part that owns `rel_id`.
    pub slide_path: String,

    /// The candidate name.
    pub name: String,

    /// Which heuristic produced it.
    pub confidence: HintConfidence,
}

/// One entry of an OLE compound file directory stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OleDirectoryEntry {
    /// Decoded entry name.
    pub name: String,

    /// Declared name length in bytes, including the terminator.
    pub name_length: u16,

    /// Raw entry type (1 storage, 2 stream, 5 root).
    pub entry_kind: u8,

    /// First sector of the entry's data.
    pub start_sector: u32,
}

/// Where the final output name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameOrigin {
    /// User-supplied name mapping.
    Mapping,
    /// Display-name hint from slide markup.
    Hint,
    /// Root entry name of an embedded compound file.
    OleRoot,
    /// The container's own part name.
    Generic,
}

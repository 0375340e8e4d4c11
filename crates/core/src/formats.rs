//! Registry of file formats the classifier can name.
//!
//! Each entry pairs a canonical extension with its description, MIME type,
//! container kind, and coarse category. Extensions are lowercase, without
//! the leading dot.

use crate::types::{ContainerKind, DetectedType, FileCategory};

/// Static description of a known format.
#[derive(Debug, Clone, Copy)]
pub struct FormatInfo {
    pub extension: &'static str,
    pub description: &'static str,
    pub mime: &'static str,
    pub kind: ContainerKind,
    pub category: FileCategory,
}

impl FormatInfo {
    /// Build an owned `DetectedType` from this entry.
    pub fn detected(&self) -> DetectedType {
        DetectedType {
            extension: self.extension.to_string(),
            description: self.description.to_string(),
            mime: self.mime.to_string(),
            kind: self.kind,
            category: self.category,
        }
    }
}

const fn format(
    extension: &'static str,
    description: &'static str,
    mime: &'static str,
    kind: ContainerKind,
    category: FileCategory,
) -> FormatInfo {
    FormatInfo {
        extension,
        description,
        mime,
        kind,
        category,
    }
}

use ContainerKind::{FlatBinary, OleCompound, Text, Unknown, ZipBased};
use FileCategory::*;

/// All formats with a canonical extension.
pub static KNOWN_FORMATS: &[FormatInfo] = &[
    // Office Open XML
    format("docx", "Microsoft Word Document", "application/vnd.openxmlformats-officedocument.wordprocessingml.document", ZipBased, Document),
    format("xlsx", "Microsoft Excel Workbook", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet", ZipBased, Spreadsheet),
    format("pptx", "Microsoft PowerPoint Presentation", "application/vnd.openxmlformats-officedocument.presentationml.presentation", ZipBased, Presentation),
    format("zip", "ZIP Archive", "application/zip", ZipBased, Archive),
    // Legacy compound documents
    format("doc", "Microsoft Word Document (97-2003)", "application/msword", OleCompound, Document),
    format("xls", "Microsoft Excel Workbook (97-2003)", "application/vnd.ms-excel", OleCompound, Spreadsheet),
    format("ppt", "Microsoft PowerPoint Presentation (97-2003)", "application/vnd.ms-powerpoint", OleCompound, Presentation),
    format("ole", "OLE Compound Document", "application/x-ole-storage", OleCompound, Other),
    // Documents
    format("pdf", "PDF Document", "application/pdf", FlatBinary, Document),
    format("rtf", "Rich Text Document", "application/rtf", Text, Document),
    format("txt", "Text File", "text/plain", Text, Document),
    // Images
    format("jpg", "JPEG Image", "image/jpeg", FlatBinary, Image),
    format("png", "PNG Image", "image/png", FlatBinary, Image),
    format("gif", "GIF Image", "image/gif", FlatBinary, Image),
    format("bmp", "BMP Image", "image/bmp", FlatBinary, Image),
    format("tif", "TIFF Image", "image/tiff", FlatBinary, Image),
    format("wmf", "Windows Metafile", "image/wmf", FlatBinary, Image),
    format("emf", "Enhanced Metafile", "image/emf", FlatBinary, Image),
    format("webp", "WebP Image", "image/webp", FlatBinary, Image),
    // Audio
    format("mp3", "MP3 Audio", "audio/mpeg", FlatBinary, Audio),
    format("wav", "WAV Audio", "audio/wav", FlatBinary, Audio),
    format("m4a", "MPEG-4 Audio", "audio/mp4", FlatBinary, Audio),
    format("ogg", "Ogg Media", "audio/ogg", FlatBinary, Audio),
    format("flac", "FLAC Audio", "audio/flac", FlatBinary, Audio),
    // Video
    format("mp4", "MP4 Video", "video/mp4", FlatBinary, Video),
    format("mov", "QuickTime Video", "video/quicktime", FlatBinary, Video),
    format("avi", "AVI Video", "video/x-msvideo", FlatBinary, Video),
    format("riff", "RIFF Container", "application/octet-stream", FlatBinary, Other),
    // Archives
    format("gz", "Gzip Archive", "application/gzip", FlatBinary, Archive),
    format("bz2", "Bzip2 Archive", "application/x-bzip2", FlatBinary, Archive),
    format("7z", "7-Zip Archive", "application/x-7z-compressed", FlatBinary, Archive),
    format("rar", "RAR Archive", "application/vnd.rar", FlatBinary, Archive),
    // Executables
    format("exe", "Windows Executable", "application/x-msdownload", FlatBinary, Executable),
    format("elf", "ELF Executable", "application/x-executable", FlatBinary, Executable),
    // Fallback
    format("bin", "Unknown Binary", "application/octet-stream", Unknown, Other),
];

/// Extension spellings that map onto a canonical entry.
static ALIASES: &[(&str, &str)] = &[
    ("jpeg", "jpg"),
    ("jpe", "jpg"),
    ("tiff", "tif"),
    ("text", "txt"),
    ("log", "txt"),
    ("gzip", "gz"),
    ("m4v", "mp4"),
];

/// Look up a format by extension (case-insensitive, dot optional).
pub fn lookup(extension: &str) -> Option<&'static FormatInfo> {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| *alias == ext)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(ext.as_str());

    KNOWN_FORMATS.iter().find(|f| f.extension == canonical)
}

/// Detected type for a registry extension; unknown extensions get a generic entry.
pub fn builtin(extension: &str) -> DetectedType {
    lookup(extension)
        .map(FormatInfo::detected)
        .unwrap_or_else(|| DetectedType {
            extension: extension.to_string(),
            description: format!("{} File", extension.to_uppercase()),
            mime: "application/octet-stream".to_string(),
            kind: ContainerKind::Unknown,
            category: FileCategory::Other,
        })
}

/// Whether an extension names a format in the registry.
///
/// The generic `bin` fallback does not count as recognized.
pub fn is_recognized_extension(extension: &str) -> bool {
    lookup(extension).is_some_and(|f| f.kind != ContainerKind::Unknown)
}

//! Content-based type detection for embedded parts.
//!
//! Magic bytes decide first. ZIP and compound-file matches are refined by
//! looking inside them; the declared extension and a text heuristic are
//! consulted only when no signature matches. Classification never fails.

use embed_core::formats::{builtin, lookup};
use embed_core::naming::split_extension;
use embed_core::types::bare_name;
use embed_core::{ContainerKind, DetectedType, ExtractorConfig};
use embed_ole::detect_application;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// A magic byte sequence at a fixed offset.
struct Signature {
    offset: usize,
    magic: &'static [u8],
    extension: &'static str,
}

const fn sig(offset: usize, magic: &'static [u8], extension: &'static str) -> Signature {
    Signature {
        offset,
        magic,
        extension,
    }
}

/// Known signatures; the longest matching one wins.
static SIGNATURES: &[Signature] = &[
    sig(0, b"PK\x03\x04", "zip"),
    sig(0, b"PK\x05\x06", "zip"),
    sig(0, b"PK\x07\x08", "zip"),
    sig(0, &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1], "ole"),
    sig(0, b"%PDF", "pdf"),
    sig(0, b"{\\rtf", "rtf"),
    sig(0, b"{\\rtf1", "rtf"),
    sig(0, &[0xFF, 0xD8, 0xFF], "jpg"),
    sig(0, &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A], "png"),
    sig(0, b"GIF87a", "gif"),
    sig(0, b"GIF89a", "gif"),
    sig(0, b"BM", "bmp"),
    sig(0, b"II*\x00", "tif"),
    sig(0, b"MM\x00*", "tif"),
    sig(0, &[0xD7, 0xCD, 0xC6, 0x9A], "wmf"),
    sig(0, &[0x01, 0x00, 0x09, 0x00, 0x00, 0x03], "wmf"),
    sig(40, b" EMF", "emf"),
    sig(0, b"ID3", "mp3"),
    sig(0, &[0xFF, 0xFB], "mp3"),
    sig(0, &[0xFF, 0xF3], "mp3"),
    sig(0, &[0xFF, 0xF2], "mp3"),
    sig(0, b"OggS", "ogg"),
    sig(0, b"fLaC", "flac"),
    sig(0, b"RIFF", "riff"),
    sig(4, b"ftyp", "mp4"),
    sig(0, &[0x1F, 0x8B], "gz"),
    sig(0, b"BZh", "bz2"),
    sig(0, &[0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C], "7z"),
    sig(0, b"Rar!\x1A\x07", "rar"),
    sig(0, b"MZ", "exe"),
    sig(0, b"\x7FELF", "elf"),
    sig(0, &[0xEF, 0xBB, 0xBF], "txt"),
    sig(0, &[0xFF, 0xFE], "txt"),
    sig(0, &[0xFE, 0xFF], "txt"),
];

/// Characteristic parts of each Office Open XML document type.
const OOXML_MAIN_PARTS: &[(&str, &str)] = &[
    ("word/document.xml", "docx"),
    ("xl/workbook.xml", "xlsx"),
    ("ppt/presentation.xml", "pptx"),
];

/// Content-type markers in `[Content_Types].xml`.
const OOXML_CONTENT_TYPES: &[(&str, &str)] = &[
    ("wordprocessingml", "docx"),
    ("spreadsheetml", "xlsx"),
    ("presentationml", "pptx"),
];

/// Find the longest signature matching `data`.
fn match_signature(data: &[u8]) -> Option<&'static Signature> {
    SIGNATURES
        .iter()
        .filter(|s| {
            data.get(s.offset..s.offset + s.magic.len())
                .is_some_and(|window| window == s.magic)
        })
        .max_by_key(|s| s.magic.len())
}

/// Classify a part by content, falling back to its declared path.
pub fn classify(data: &[u8], declared_path: Option<&str>, config: &ExtractorConfig) -> DetectedType {
    if let Some(signature) = match_signature(data) {
        let detected = match signature.extension {
            "zip" => refine_zip(data),
            "ole" => refine_compound(data, config),
            "riff" => refine_riff(data),
            "mp4" => refine_iso_media(data),
            ext => builtin(ext),
        };
        log::debug!(
            "Signature match '{}' at offset {} -> {}",
            signature.extension,
            signature.offset,
            detected.extension
        );
        return detected;
    }

    if let Some(info) = declared_path
        .map(bare_name)
        .and_then(|name| split_extension(name).1)
        .and_then(lookup)
        .filter(|info| info.kind != ContainerKind::Unknown)
    {
        log::debug!("No signature; trusting declared extension '{}'", info.extension);
        return info.detected();
    }

    if looks_like_text(data, config.text_sample_len, config.text_printable_ratio) {
        DetectedType::text()
    } else {
        DetectedType::unknown()
    }
}

/// Tell Office Open XML documents apart from plain ZIP archives.
fn refine_zip(data: &[u8]) -> DetectedType {
    let mut archive = match ZipArchive::new(Cursor::new(data)) {
        Ok(archive) => archive,
        Err(e) => {
            log::debug!("ZIP signature but archive unreadable: {}", e);
            return builtin("zip");
        }
    };

    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    if let Some((_, ext)) = OOXML_MAIN_PARTS
        .iter()
        .find(|(part, _)| names.iter().any(|name| name == part))
    {
        return builtin(ext);
    }

    let mut content_types = String::new();
    let read = archive
        .by_name("[Content_Types].xml")
        .ok()
        .and_then(|mut file| file.read_to_string(&mut content_types).ok());
    if read.is_some() {
        if let Some((_, ext)) = OOXML_CONTENT_TYPES
            .iter()
            .find(|(marker, _)| content_types.contains(marker))
        {
            return builtin(ext);
        }
    }

    builtin("zip")
}

/// Name the legacy application behind a compound file, if any.
fn refine_compound(data: &[u8], config: &ExtractorConfig) -> DetectedType {
    match detect_application(data, config.ole_scan_window) {
        Some(app) => builtin(app.extension()),
        None => builtin("ole"),
    }
}

fn refine_riff(data: &[u8]) -> DetectedType {
    match data.get(8..12) {
        Some(b"WAVE") => builtin("wav"),
        Some(b"AVI ") => builtin("avi"),
        Some(b"WEBP") => builtin("webp"),
        _ => builtin("riff"),
    }
}

fn refine_iso_media(data: &[u8]) -> DetectedType {
    match data.get(8..12) {
        Some(b"qt  ") => builtin("mov"),
        Some(b"M4A ") => builtin("m4a"),
        _ => builtin("mp4"),
    }
}

/// Whether a bounded prefix decodes to mostly printable text.
///
/// A multi-byte sequence cut off by the sample boundary is dropped rather
/// than counted as invalid.
pub fn looks_like_text(data: &[u8], sample_len: usize, min_ratio: f64) -> bool {
    let mut sample = &data[..data.len().min(sample_len)];
    if let Err(e) = std::str::from_utf8(sample) {
        if e.error_len().is_none() {
            sample = &sample[..e.valid_up_to()];
        }
    }

    let decoded = String::from_utf8_lossy(sample);
    let mut total = 0usize;
    let mut printable = 0usize;
    for c in decoded.chars() {
        total += 1;
        if c != char::REPLACEMENT_CHARACTER && (c.is_whitespace() || !c.is_control()) {
            printable += 1;
        }
    }

    total > 0 && printable as f64 / total as f64 >= min_ratio
}

//! Legacy Office application detection for compound files.

use cfb::CompoundFile;
use std::io::Cursor;

/// Legacy Office application that authored a compound document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyApplication {
    Word,
    Excel,
    PowerPoint,
}

impl LegacyApplication {
    /// Canonical extension of the application's binary format.
    pub fn extension(&self) -> &'static str {
        match self {
            LegacyApplication::Word => "doc",
            LegacyApplication::Excel => "xls",
            LegacyApplication::PowerPoint => "ppt",
        }
    }
}

/// Class-name substrings, checked in order against lowercased bytes.
const MARKERS: &[(&[u8], LegacyApplication)] = &[
    (b"microsoft office word", LegacyApplication::Word),
    (b"word.document", LegacyApplication::Word),
    (b"microsoft office excel", LegacyApplication::Excel),
    (b"excel.sheet", LegacyApplication::Excel),
    (b"microsoft office powerpoint", LegacyApplication::PowerPoint),
    (b"powerpoint.slide", LegacyApplication::PowerPoint),
    (b"wordpad", LegacyApplication::Word),
];

/// Root-level streams that identify the application.
const STREAMS: &[(&str, LegacyApplication)] = &[
    ("/WordDocument", LegacyApplication::Word),
    ("/Workbook", LegacyApplication::Excel),
    ("/Book", LegacyApplication::Excel),
    ("/PowerPoint Document", LegacyApplication::PowerPoint),
];

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// Scan the first `window` bytes for application class names.
///
/// Class names appear both as ANSI strings and as UTF-16; the scan also runs
/// over the window with NUL bytes removed to catch the latter.
pub fn scan_markers(data: &[u8], window: usize) -> Option<LegacyApplication> {
    let head = data[..data.len().min(window)].to_ascii_lowercase();
    let packed: Vec<u8> = head.iter().copied().filter(|&b| b != 0).collect();

    MARKERS
        .iter()
        .find(|(marker, _)| contains(&head, marker) || contains(&packed, marker))
        .map(|(_, app)| *app)
}

/// Identify the application from the compound file's stream names.
pub fn scan_streams(data: &[u8]) -> Option<LegacyApplication> {
    let cfb = match CompoundFile::open(Cursor::new(data)) {
        Ok(cfb) => cfb,
        Err(e) => {
            log::debug!("Compound file could not be opened for stream scan: {}", e);
            return None;
        }
    };

    STREAMS
        .iter()
        .find(|(stream, _)| {
            cfb.walk()
                .any(|entry| entry.is_stream() && entry.path().to_string_lossy() == *stream)
        })
        .map(|(_, app)| *app)
}

/// Detect the authoring application: marker scan first, then stream names.
pub fn detect_application(data: &[u8], window: usize) -> Option<LegacyApplication> {
    scan_markers(data, window).or_else(|| scan_streams(data))
}

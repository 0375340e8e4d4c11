//! Output naming for extracted parts.
//!
//! Decides the base name and extension of every extracted file from the
//! available sources (user mapping, slide hint, compound-file root name, the
//! part's own name) and keeps names unique within one output directory.

use crate::formats;
use crate::types::{DetectedType, NameOrigin};
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Part names the container generates for opaque objects: a word, an ordinal, `.bin`.
static GENERIC_PART_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z][a-z_]*\d+\.bin$").unwrap());

/// Placeholder names the authoring tool assigns to unnamed objects ("Object 3").
static GENERIC_OBJECT_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^object(\s*\d+)?$").unwrap());

/// Office document extensions that mark a frame name as a filename.
static OFFICE_EXTENSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(docx?|xlsx?|pptx?|pdf|rtf)").unwrap());

/// Collapses whitespace runs inside recovered names.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Characters that cannot appear in a file name on common filesystems.
const RESERVED_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Longest extension accepted when splitting a name.
const MAX_EXTENSION_LEN: usize = 8;

/// Whether a part's bare name follows the generic object naming convention.
pub fn is_generic_part_name(bare_name: &str) -> bool {
    GENERIC_PART_NAME_REGEX.is_match(bare_name)
}

/// Whether a display name is an authoring-tool placeholder rather than a real name.
pub fn is_generic_display_name(name: &str) -> bool {
    let trimmed = name.trim();
    trimmed.is_empty() || GENERIC_OBJECT_TOKEN_REGEX.is_match(trimmed)
}

/// Whether a display name looks like a filename: a dot or an office extension.
pub fn looks_like_filename(name: &str) -> bool {
    name.contains('.') || OFFICE_EXTENSION_REGEX.is_match(name)
}

/// NFC-normalize, trim, and collapse whitespace in a recovered name.
pub fn normalize_display_name(name: &str) -> String {
    let composed: String = name.nfc().collect();
    WHITESPACE_COLLAPSE_REGEX
        .replace_all(composed.trim(), " ")
        .to_string()
}

/// Make a name safe to use as a single path component.
///
/// Returns `None` when nothing usable remains.
pub fn sanitize_file_component(name: &str) -> Option<String> {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c.is_control() || RESERVED_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    let cleaned = replaced.trim().trim_end_matches(['.', ' ']).to_string();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_' || c == '.') {
        None
    } else {
        Some(cleaned)
    }
}

/// Split `name.ext` into stem and extension.
///
/// Leading-dot names, empty extensions, and extensions that are too long or
/// not alphanumeric count as having no extension.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            (stem, Some(ext))
        }
        _ => (name, None),
    }
}

/// Split off the extension only when it names a known format.
pub fn split_known_extension(name: &str) -> (&str, Option<&str>) {
    match split_extension(name) {
        (stem, Some(ext)) if formats::is_recognized_extension(ext) => (stem, Some(ext)),
        _ => (name, None),
    }
}

/// Candidate names gathered for one part, strongest source first.
#[derive(Debug, Clone, Default)]
pub struct NameSources<'a> {
    /// User-supplied original name.
    pub mapping: Option<&'a str>,
    /// Best display-name hint from slide markup.
    pub hint: Option<&'a str>,
    /// Root entry name of the part when it is a compound file.
    pub ole_root: Option<&'a str>,
}

/// A naming decision before collision handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    /// Base name without extension.
    pub base: String,
    /// Extension without the dot; empty when the file gets none.
    pub extension: String,
    /// Which source won.
    pub origin: NameOrigin,
}

impl ResolvedName {
    /// `base.extension`, or just `base` without an extension.
    pub fn file_name(&self) -> String {
        join_name(&self.base, &self.extension)
    }
}

fn join_name(base: &str, extension: &str) -> String {
    if extension.is_empty() {
        base.to_string()
    } else {
        format!("{}.{}", base, extension)
    }
}

/// Name a part from an authored name (mapping or hint).
///
/// A recognized extension on the authored name is stripped; the detected
/// extension replaces it unless detection was weak.
fn from_authored(name: &str, detected: &DetectedType, origin: NameOrigin) -> Option<ResolvedName> {
    let normalized = normalize_display_name(name);
    let (stem, authored_ext) = split_known_extension(&normalized);
    let base = sanitize_file_component(stem)?;

    let extension = match authored_ext {
        Some(ext) if detected.is_weak() => ext.to_ascii_lowercase(),
        _ => detected.extension.clone(),
    };

    Some(ResolvedName {
        base,
        extension,
        origin,
    })
}

/// Decide the output name of a part.
///
/// Generic part names (`oleObject3.bin`) are replaced by the strongest
/// available source: mapping, then hint, then compound-file root name, then
/// the part's own stem with the detected extension. Specific part names keep
/// their name and gain the detected extension only when they have none. A
/// mapping overrides either kind.
pub fn resolve_name(bare_name: &str, detected: &DetectedType, sources: &NameSources<'_>) -> ResolvedName {
    if let Some(resolved) = sources
        .mapping
        .and_then(|name| from_authored(name, detected, NameOrigin::Mapping))
    {
        return resolved;
    }

    if is_generic_part_name(bare_name) {
        if let Some(resolved) = sources
            .hint
            .and_then(|name| from_authored(name, detected, NameOrigin::Hint))
        {
            return resolved;
        }

        if let Some(base) = sources
            .ole_root
            .map(normalize_display_name)
            .and_then(|name| sanitize_file_component(&name))
        {
            return ResolvedName {
                base,
                extension: detected.extension.clone(),
                origin: NameOrigin::OleRoot,
            };
        }

        let (stem, _) = split_extension(bare_name);
        return ResolvedName {
            base: sanitize_file_component(stem).unwrap_or_else(|| "object".to_string()),
            extension: detected.extension.clone(),
            origin: NameOrigin::Generic,
        };
    }

    let (stem, existing_ext) = split_extension(bare_name);
    let base = sanitize_file_component(stem).unwrap_or_else(|| "object".to_string());
    let extension = match existing_ext {
        Some(ext) => ext.to_string(),
        None => detected.extension.clone(),
    };

    ResolvedName {
        base,
        extension,
        origin: NameOrigin::Generic,
    }
}

/// Hands out unique file names inside one target directory.
///
/// A name is free when this resolver has not handed it out and no file with
/// that name exists yet. Taken names get `_1`, `_2`, ... before the extension.
#[derive(Debug)]
pub struct CollisionResolver {
    dir: PathBuf,
    claimed: HashSet<String>,
    check_disk: bool,
}

impl CollisionResolver {
    /// Create a resolver for files written into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            claimed: HashSet::new(),
            check_disk: true,
        }
    }

    /// Create a resolver that only tracks its own claims, for planning.
    pub fn in_memory() -> Self {
        Self {
            dir: PathBuf::new(),
            claimed: HashSet::new(),
            check_disk: false,
        }
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn is_free(&self, file_name: &str) -> bool {
        !self.claimed.contains(&file_name.to_lowercase())
            && !(self.check_disk && self.dir.join(file_name).exists())
    }

    /// Claim a unique file name for `base.extension`.
    pub fn claim(&mut self, base: &str, extension: &str) -> String {
        let mut candidate = join_name(base, extension);
        let mut counter = 1;

        while !self.is_free(&candidate) {
            candidate = join_name(&format!("{}_{}", base, counter), extension);
            counter += 1;
        }

        self.claimed.insert(candidate.to_lowercase());
        candidate
    }
}

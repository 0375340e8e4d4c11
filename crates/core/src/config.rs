//! Extraction settings.

use crate::types::HintConfidence;
use serde::{Deserialize, Serialize};

/// Part path prefixes that hold embedded objects.
pub const DEFAULT_EMBEDDED_PREFIXES: &[&str] = &[
    "ppt/embeddings/",
    "ppt/media/",
    "word/embeddings/",
    "xl/embeddings/",
];

/// Order in which display-name hint heuristics outrank each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HintPrecedence {
    /// The placeholder's own frame name beats filename-like names elsewhere.
    #[default]
    EnclosingFrameFirst,
    /// Filename-like names beat the placeholder's own frame name.
    FilenameLikeFirst,
}

impl HintPrecedence {
    /// Rank of a confidence level under this policy; higher wins.
    pub fn rank(&self, confidence: HintConfidence) -> u8 {
        match (self, confidence) {
            (HintPrecedence::EnclosingFrameFirst, HintConfidence::EnclosingFrame) => 2,
            (HintPrecedence::EnclosingFrameFirst, HintConfidence::FilenameLike) => 1,
            (HintPrecedence::FilenameLikeFirst, HintConfidence::EnclosingFrame) => 1,
            (HintPrecedence::FilenameLikeFirst, HintConfidence::FilenameLike) => 2,
        }
    }
}

/// Settings for one extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Part path prefixes scanned for embedded objects.
    pub embedded_prefixes: Vec<String>,

    /// Ranking policy for display-name hints.
    pub hint_precedence: HintPrecedence,

    /// Bytes of a compound file scanned for application markers.
    pub ole_scan_window: usize,

    /// Bytes sampled when deciding whether unmatched content is text.
    pub text_sample_len: usize,

    /// Minimum share of printable code points for content to count as text.
    pub text_printable_ratio: f64,

    /// Write into `<output>/<container stem>/` instead of `<output>/`.
    pub subdirectory_per_container: bool,

    /// Compare written file sizes against the source parts.
    pub verify_writes: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            embedded_prefixes: DEFAULT_EMBEDDED_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            hint_precedence: HintPrecedence::default(),
            ole_scan_window: 4096,
            text_sample_len: 1024,
            text_printable_ratio: 0.7,
            subdirectory_per_container: false,
            verify_writes: true,
        }
    }
}

impl ExtractorConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the embedded-object prefixes.
    pub fn with_embedded_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.embedded_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the hint ranking policy.
    pub fn with_hint_precedence(mut self, precedence: HintPrecedence) -> Self {
        self.hint_precedence = precedence;
        self
    }

    /// Set how many bytes of a compound file are scanned for markers.
    pub fn with_ole_scan_window(mut self, bytes: usize) -> Self {
        self.ole_scan_window = bytes.max(8);
        self
    }

    /// Set the text sampling length.
    pub fn with_text_sample_len(mut self, bytes: usize) -> Self {
        self.text_sample_len = bytes.max(1);
        self
    }

    /// Set the printable ratio threshold, clamped to `0.0..=1.0`.
    pub fn with_text_printable_ratio(mut self, ratio: f64) -> Self {
        self.text_printable_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Write each container into its own subdirectory.
    pub fn with_subdirectory_per_container(mut self, enabled: bool) -> Self {
        self.subdirectory_per_container = enabled;
        self
    }

    /// Enable or disable post-write size verification.
    pub fn with_verify_writes(mut self, enabled: bool) -> Self {
        self.verify_writes = enabled;
        self
    }

    /// Whether a part path lies under one of the embedded-object prefixes.
    pub fn is_embedded_path(&self, path: &str) -> bool {
        !path.ends_with('/')
            && self
                .embedded_prefixes
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

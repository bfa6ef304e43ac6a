//! Raw and normalized content types flowing through the pipeline.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::url::Platform;

/// How a piece of content was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Live extraction from the platform succeeded.
    Primary,

    /// Built from caller-supplied context text after an anti-crawling
    /// block; degraded but valid.
    ContextAssisted,

    /// Extraction produced images but no usable text (all OCR below
    /// threshold, or otherwise incomplete).
    Partial,
}

impl ExtractionMode {
    /// Base node confidence for graphs built from this mode.
    pub fn base_confidence(self) -> f32 {
        match self {
            ExtractionMode::Primary => 1.0,
            ExtractionMode::ContextAssisted => 0.6,
            ExtractionMode::Partial => 0.3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionMode::Primary => "primary",
            ExtractionMode::ContextAssisted => "context-assisted",
            ExtractionMode::Partial => "partial",
        }
    }
}

impl std::fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a text block came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// Native platform text (title, description, answer body, ...).
    Native,

    /// Text recognized from an image by the OCR collaborator.
    Image,
}

/// One ordered block of extracted text with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    pub source: TextSource,
}

impl TextBlock {
    pub fn native(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: TextSource::Native,
        }
    }

    pub fn from_image(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: TextSource::Image,
        }
    }
}

/// Opaque reference to an image carried by the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
}

impl ImageRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// A metadata value; platforms report strings and numbers.
///
/// Modeling the closed set here (rather than passing `serde_json::Value`
/// around) keeps validation at the normalizer boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    String(String),
    Integer(i64),
    Float(f64),
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetaValue::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::String(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::String(s)
    }
}

impl From<i64> for MetaValue {
    fn from(n: i64) -> Self {
        MetaValue::Integer(n)
    }
}

impl From<f64> for MetaValue {
    fn from(n: f64) -> Self {
        MetaValue::Float(n)
    }
}

impl std::fmt::Display for MetaValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetaValue::String(s) => f.write_str(s),
            MetaValue::Integer(n) => write!(f, "{n}"),
            MetaValue::Float(n) => write!(f, "{n}"),
        }
    }
}

/// Platform-agnostic bag produced by an extractor.
///
/// Owned exclusively by one pipeline run and discarded after
/// normalization. Insertion order of `metadata` is preserved
/// (`IndexMap`) so extractors control display order, but the normalizer
/// never depends on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawContent {
    /// Ordered text blocks, source order preserved.
    pub text_blocks: Vec<TextBlock>,

    /// Ordered image references.
    pub images: Vec<ImageRef>,

    /// Well-known optional keys vary by platform: title, author,
    /// description, duration, like_count, view_count, publish_time, ...
    pub metadata: IndexMap<String, MetaValue>,

    pub extraction_mode: ExtractionMode,
}

impl RawContent {
    pub fn new() -> Self {
        Self {
            text_blocks: Vec::new(),
            images: Vec::new(),
            metadata: IndexMap::new(),
            extraction_mode: ExtractionMode::Primary,
        }
    }

    /// Build degraded content directly from caller-supplied context text,
    /// used by the fallback controller after an anti-crawling block.
    pub fn from_context(context_text: &str) -> Self {
        let mut content = Self::new();
        content.extraction_mode = ExtractionMode::ContextAssisted;
        for paragraph in context_text
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
        {
            content.text_blocks.push(TextBlock::native(paragraph));
        }
        content
    }

    pub fn push_text(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.trim().is_empty() {
            self.text_blocks.push(TextBlock::native(text));
        }
    }

    pub fn push_image(&mut self, url: impl Into<String>) {
        self.images.push(ImageRef::new(url));
    }

    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Whether the extractor populated anything at all.
    pub fn has_content(&self) -> bool {
        self.has_native_text() || !self.images.is_empty()
    }

    /// Whether any non-empty native (non-OCR) text exists.
    pub fn has_native_text(&self) -> bool {
        self.text_blocks
            .iter()
            .any(|b| b.source == TextSource::Native && !b.text.trim().is_empty())
    }
}

impl Default for RawContent {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-image recognition result from the OCR collaborator.
///
/// Merged into `RawContent.text_blocks` by the OCR adapter; not retained
/// independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    pub text: String,
    pub confidence: f32,
}

/// One semantic paragraph of normalized content, with OCR provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub source: TextSource,
}

/// Canonical platform-independent record produced by the normalizer.
///
/// Invariant: `body_segments` is never empty unless
/// `extraction_mode == Partial`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedContent {
    pub title: String,

    /// Ordered semantic paragraphs.
    pub body_segments: Vec<Segment>,

    /// Entity name -> dominant provenance. Keys form the mentioned-entity
    /// set; the value is `Native` if the entity appears in any native
    /// segment, `Image` if it was seen only in OCR text. A `BTreeMap`
    /// keeps the set ordered so output is stable under metadata-key
    /// reordering.
    pub mentioned_entities: BTreeMap<String, TextSource>,

    pub source_platform: Platform,
    pub canonical_id: String,
    pub extraction_mode: ExtractionMode,

    /// Whether the title itself came only from OCR text.
    pub title_from_image: bool,
}

impl NormalizedContent {
    /// Segment count that originated from OCR text.
    pub fn ocr_segment_count(&self) -> usize {
        self.body_segments
            .iter()
            .filter(|s| s.source == TextSource::Image)
            .count()
    }
}

//! Content normalizer - platform-agnostic cleaning and segmentation.
//!
//! Pure function from `RawContent` to `NormalizedContent`: identical
//! input always yields identical output, regardless of metadata key
//! order. Strips platform boilerplate, segments text into semantic
//! paragraphs with punctuation/line-break heuristics tuned for mixed
//! CJK/latin text, and extracts mentioned entities heuristically
//! (hashtags, @-mentions, capitalized latin phrases) with no external
//! NLP model.

use regex::Regex;
use std::collections::BTreeMap;

use crate::types::content::{
    ExtractionMode, MetaValue, NormalizedContent, RawContent, Segment, TextSource,
};
use crate::types::url::SourceUrl;

/// Segments longer than this get split at sentence boundaries.
const MAX_SEGMENT_CHARS: usize = 200;

/// Title length cap when derived from the first segment.
const MAX_TITLE_CHARS: usize = 80;

/// Share-chrome and watermark markers. A line consisting of (or
/// wrapping) only these is platform UI, not content.
const BOILERPLATE_MARKERS: [&str; 10] = [
    "复制打开抖音",
    "打开抖音",
    "抖音搜索",
    "打开小红书",
    "小红书APP",
    "长按复制此条消息",
    "点赞关注",
    "欢迎关注",
    "下载APP",
    "戳这里",
];

/// Latin words that start sentences but are never entities.
const LATIN_STOPWORDS: [&str; 12] = [
    "The", "This", "That", "What", "When", "Where", "How", "Why", "And", "But", "With", "From",
];

/// Normalize raw extracted content into the canonical record.
pub fn normalize(raw: &RawContent, source: &SourceUrl) -> NormalizedContent {
    let segments = segment_blocks(raw);

    let (title, title_from_image) = extract_title(raw, &segments);
    let mentioned_entities = extract_entities(&segments, raw);

    // The invariant says body segments are only empty for partial
    // content; content that cleaned down to nothing is partial by
    // definition.
    let extraction_mode = if segments.is_empty() {
        ExtractionMode::Partial
    } else {
        raw.extraction_mode
    };

    NormalizedContent {
        title,
        body_segments: segments,
        mentioned_entities,
        source_platform: source.platform,
        canonical_id: source.canonical_id.clone(),
        extraction_mode,
        title_from_image,
    }
}

/// Split all text blocks into cleaned paragraph segments, preserving
/// source order and OCR provenance.
fn segment_blocks(raw: &RawContent) -> Vec<Segment> {
    let mut segments = Vec::new();

    for block in &raw.text_blocks {
        for line in block.text.split('\n') {
            let Some(cleaned) = clean_line(line) else {
                continue;
            };

            if cleaned.chars().count() <= MAX_SEGMENT_CHARS {
                segments.push(Segment {
                    text: cleaned,
                    source: block.source,
                });
                continue;
            }

            // Long paragraphs split at sentence punctuation, grouped
            // back up to the segment cap.
            for chunk in split_sentences(&cleaned) {
                segments.push(Segment {
                    text: chunk,
                    source: block.source,
                });
            }
        }
    }

    segments
}

/// Clean one line; `None` when nothing but boilerplate remains.
fn clean_line(line: &str) -> Option<String> {
    let mut text = line.trim().to_string();
    if text.is_empty() {
        return None;
    }

    // Douyin share text leads with a checksum-looking token and an
    // in-app link, e.g. "3.99 Abc:/ 复制打开抖音".
    let share_prefix = Regex::new(r"^\d+\.\d+\s+[A-Za-z0-9:/ ]+\s*").unwrap();
    text = share_prefix.replace(&text, "").trim().to_string();

    for marker in BOILERPLATE_MARKERS {
        if text.contains(marker) {
            return None;
        }
    }

    // Collapse runs of internal whitespace.
    let spaces = Regex::new(r"[ \t]{2,}").unwrap();
    text = spaces.replace_all(&text, " ").to_string();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Split text at CJK/latin sentence punctuation, regrouping sentences
/// into chunks no longer than the segment cap.
fn split_sentences(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for piece in split_inclusive_terminators(text) {
        if !current.is_empty()
            && current.chars().count() + piece.chars().count() > MAX_SEGMENT_CHARS
        {
            chunks.push(current.trim().to_string());
            current = String::new();
        }
        current.push_str(piece);
    }
    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }

    chunks.retain(|c| !c.is_empty());
    chunks
}

/// Split after sentence terminators, keeping the terminator attached.
fn split_inclusive_terminators(text: &str) -> Vec<&str> {
    const TERMINATORS: [char; 8] = ['。', '！', '？', '；', '.', '!', '?', ';'];
    let mut pieces = Vec::new();
    let mut start = 0;

    for (idx, ch) in text.char_indices() {
        if TERMINATORS.contains(&ch) {
            let end = idx + ch.len_utf8();
            pieces.push(&text[start..end]);
            start = end;
        }
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

/// Title selection: explicit metadata title wins; otherwise the first
/// segment, truncated at the first sentence boundary or the title cap.
fn extract_title(raw: &RawContent, segments: &[Segment]) -> (String, bool) {
    if let Some(MetaValue::String(title)) = raw.metadata.get("title") {
        let trimmed = title.trim();
        if !trimmed.is_empty() {
            return (trimmed.to_string(), false);
        }
    }

    match segments.first() {
        Some(first) => {
            let sentence = split_inclusive_terminators(&first.text)
                .first()
                .copied()
                .unwrap_or(first.text.as_str());
            let title: String = sentence
                .trim_end_matches(['。', '！', '？', '；', '.', '!', '?', ';'])
                .chars()
                .take(MAX_TITLE_CHARS)
                .collect();
            (title.trim().to_string(), first.source == TextSource::Image)
        }
        None => (String::from("未命名内容"), false),
    }
}

/// Heuristic entity extraction over the cleaned segments, plus the
/// author metadata field when present. The map key set is the
/// mentioned-entity set; the value records whether the entity appeared
/// in native text or only in OCR text.
fn extract_entities(segments: &[Segment], raw: &RawContent) -> BTreeMap<String, TextSource> {
    let hashtag_closed = Regex::new(r"#([^#\s]{1,30})#").unwrap();
    let hashtag_open = Regex::new(r"#([\p{Han}A-Za-z0-9_]{1,30})").unwrap();
    let mention = Regex::new(r"@([\p{Han}A-Za-z0-9_\-]{1,30})").unwrap();
    let latin_phrase =
        Regex::new(r"\b([A-Z][a-zA-Z0-9]+(?:\s+[A-Z][a-zA-Z0-9]+){0,3})\b").unwrap();

    let mut entities: BTreeMap<String, TextSource> = BTreeMap::new();
    let record = |name: &str, source: TextSource, entities: &mut BTreeMap<String, TextSource>| {
        let name = name.trim();
        if name.chars().count() < 2 {
            return;
        }
        entities
            .entry(name.to_string())
            .and_modify(|existing| {
                // Native provenance dominates: seen natively anywhere
                // means the entity is not OCR-only.
                if source == TextSource::Native {
                    *existing = TextSource::Native;
                }
            })
            .or_insert(source);
    };

    for segment in segments {
        for cap in hashtag_closed.captures_iter(&segment.text) {
            record(&cap[1], segment.source, &mut entities);
        }
        for cap in hashtag_open.captures_iter(&segment.text) {
            record(&cap[1], segment.source, &mut entities);
        }
        for cap in mention.captures_iter(&segment.text) {
            record(&cap[1], segment.source, &mut entities);
        }
        for cap in latin_phrase.captures_iter(&segment.text) {
            let phrase = cap[1].trim();
            if LATIN_STOPWORDS.contains(&phrase) {
                continue;
            }
            record(phrase, segment.source, &mut entities);
        }
    }

    if let Some(MetaValue::String(author)) = raw.metadata.get("author") {
        record(author, TextSource::Native, &mut entities);
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::url::{Platform, SourceUrl};

    fn source() -> SourceUrl {
        SourceUrl::new(
            "https://www.bilibili.com/video/BV1x",
            Platform::Bilibili,
            "BV1x",
        )
    }

    fn raw_with(blocks: &[&str]) -> RawContent {
        let mut raw = RawContent::new();
        for block in blocks {
            raw.push_text(*block);
        }
        raw
    }

    #[test]
    fn test_boilerplate_is_stripped() {
        let raw = raw_with(&[
            "真实的内容段落。",
            "7.43 Abc:/ 复制打开抖音，看看视频",
            "点赞关注不迷路",
        ]);
        let normalized = normalize(&raw, &source());
        assert_eq!(normalized.body_segments.len(), 1);
        assert_eq!(normalized.body_segments[0].text, "真实的内容段落。");
    }

    #[test]
    fn test_metadata_title_wins_over_first_segment() {
        let mut raw = raw_with(&["第一段内容。"]);
        raw.set_meta("title", "显式标题");
        let normalized = normalize(&raw, &source());
        assert_eq!(normalized.title, "显式标题");
    }

    #[test]
    fn test_title_falls_back_to_first_segment() {
        let raw = raw_with(&["第一句话。后面的内容继续。"]);
        let normalized = normalize(&raw, &source());
        assert_eq!(normalized.title, "第一句话");
    }

    #[test]
    fn test_entity_extraction() {
        let raw = raw_with(&[
            "今天聊聊 Rust Programming 的学习路线 #编程 #程序员人生# 感谢 @技术小助手",
        ]);
        let normalized = normalize(&raw, &source());
        let names: Vec<&str> = normalized
            .mentioned_entities
            .keys()
            .map(String::as_str)
            .collect();
        assert!(names.contains(&"Rust Programming"));
        assert!(names.contains(&"编程"));
        assert!(names.contains(&"程序员人生"));
        assert!(names.contains(&"技术小助手"));
    }

    #[test]
    fn test_author_metadata_becomes_entity() {
        let mut raw = raw_with(&["正文内容在这里。"]);
        raw.set_meta("author", "某作者");
        let normalized = normalize(&raw, &source());
        assert!(normalized.mentioned_entities.contains_key("某作者"));
    }

    #[test]
    fn test_ocr_only_entity_provenance() {
        let mut raw = RawContent::new();
        raw.text_blocks
            .push(crate::types::content::TextBlock::from_image(
                "图片里提到 #护肤 话题",
            ));
        let normalized = normalize(&raw, &source());
        assert_eq!(
            normalized.mentioned_entities.get("护肤"),
            Some(&TextSource::Image)
        );
    }

    #[test]
    fn test_long_paragraph_splits_at_sentences() {
        let long = "这是一个很长的句子。".repeat(40);
        let raw = raw_with(&[long.as_str()]);
        let normalized = normalize(&raw, &source());
        assert!(normalized.body_segments.len() > 1);
        for segment in &normalized.body_segments {
            assert!(segment.text.chars().count() <= MAX_SEGMENT_CHARS + 12);
        }
    }

    #[test]
    fn test_empty_content_becomes_partial() {
        let raw = RawContent::new();
        let normalized = normalize(&raw, &source());
        assert!(normalized.body_segments.is_empty());
        assert_eq!(normalized.extraction_mode, ExtractionMode::Partial);
    }

    #[test]
    fn test_determinism_under_metadata_reordering() {
        let mut a = raw_with(&["正文段落，提到 #话题。"]);
        a.set_meta("title", "标题");
        a.set_meta("author", "作者");
        a.set_meta("like_count", 5i64);

        let mut b = raw_with(&["正文段落，提到 #话题。"]);
        b.set_meta("like_count", 5i64);
        b.set_meta("author", "作者");
        b.set_meta("title", "标题");

        let na = normalize(&a, &source());
        let nb = normalize(&b, &source());
        assert_eq!(na, nb);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn block_strategy() -> impl Strategy<Value = String> {
            prop::collection::vec(
                prop::sample::select(vec![
                    "学习",
                    "Rust",
                    "所有权与借用。",
                    "#编程",
                    "@小助手",
                    "内容细节很多，值得反复观看。",
                    "hello World",
                    " ",
                ]),
                0..12,
            )
            .prop_map(|words| words.join(""))
        }

        proptest! {
            #[test]
            fn normalize_is_deterministic(blocks in prop::collection::vec(block_strategy(), 0..6)) {
                let mut raw = RawContent::new();
                for block in &blocks {
                    raw.push_text(block);
                }
                prop_assert_eq!(normalize(&raw, &source()), normalize(&raw, &source()));
            }

            #[test]
            fn normalize_ignores_metadata_order(
                blocks in prop::collection::vec(block_strategy(), 1..4),
                title in "[a-z]{1,12}",
                author in "[a-z]{1,12}",
            ) {
                let mut forward = RawContent::new();
                let mut reversed = RawContent::new();
                for block in &blocks {
                    forward.push_text(block);
                    reversed.push_text(block);
                }
                forward.set_meta("title", title.clone());
                forward.set_meta("author", author.clone());
                reversed.set_meta("author", author);
                reversed.set_meta("title", title);

                prop_assert_eq!(normalize(&forward, &source()), normalize(&reversed, &source()));
            }
        }
    }

    #[test]
    fn test_idempotence() {
        let mut raw = raw_with(&["第一段。", "第二段，有 #标签 内容。"]);
        raw.set_meta("title", "标题");
        let first = normalize(&raw, &source());

        // Re-normalizing content rebuilt from the normalized segments
        // changes nothing.
        let mut rebuilt = RawContent::new();
        for segment in &first.body_segments {
            rebuilt.push_text(&segment.text);
        }
        rebuilt.set_meta("title", first.title.clone());
        let second = normalize(&rebuilt, &source());
        assert_eq!(first.body_segments, second.body_segments);
        assert_eq!(first.title, second.title);
    }
}

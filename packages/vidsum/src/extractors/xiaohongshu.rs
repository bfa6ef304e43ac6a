//! Xiaohongshu note extractor.
//!
//! Notes are image-first: the text often lives inside the pictures, so
//! this extractor collects image references for the OCR adapter along
//! with whatever native text the note carries.

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::info;

use crate::error::{ExtractError, ExtractResult};
use crate::extractors::parse::{initial_state, meta_content, meta_contents};
use crate::traits::extractor::Extractor;
use crate::traits::fetcher::{error_for_status, FetchRequest, Fetcher};
use crate::types::content::RawContent;
use crate::types::url::{Platform, SourceUrl};

const BLOCK_GUIDANCE: &str =
    "xiaohongshu redirected to its login wall; open the note in the app, use \
     share, copy link, and pass the copied text (title and body) as \
     context_text to continue without live scraping";

pub struct XiaohongshuExtractor;

impl XiaohongshuExtractor {
    async fn resolve_note_id(
        &self,
        source: &SourceUrl,
        fetcher: &dyn Fetcher,
    ) -> ExtractResult<String> {
        if !source.is_short_link {
            return Ok(source.canonical_id.clone());
        }

        let resolved = fetcher
            .resolve_redirect(&source.raw)
            .await
            .map_err(ExtractError::from)?;

        for pattern in [r"/explore/([a-f0-9]+)", r"/discovery/item/([a-f0-9]+)"] {
            let re = Regex::new(pattern).unwrap();
            if let Some(cap) = re.captures(&resolved) {
                return Ok(cap[1].to_string());
            }
        }

        Err(ExtractError::blocked(
            format!("short link redirected to {resolved} instead of a note page"),
            BLOCK_GUIDANCE,
        ))
    }

    /// Pull note fields out of the `__INITIAL_STATE__` blob.
    fn note_from_state(state: &Value, note_id: &str) -> Option<NoteFields> {
        let note = state
            .pointer(&format!("/note/noteDetailMap/{note_id}/note"))
            .or_else(|| state.pointer("/noteData/data/noteData"))?;

        let title = note
            .pointer("/title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let desc = note
            .pointer("/desc")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let author = note
            .pointer("/user/nickname")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let liked_count = note
            .pointer("/interactInfo/likedCount")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<i64>().ok())
            .or_else(|| note.pointer("/interactInfo/likedCount").and_then(Value::as_i64));

        let images = note
            .pointer("/imageList")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|img| {
                        img.pointer("/urlDefault")
                            .or_else(|| img.pointer("/url"))
                            .and_then(Value::as_str)
                            .map(str::to_string)
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(NoteFields {
            title,
            desc,
            author,
            liked_count,
            images,
        })
    }
}

struct NoteFields {
    title: String,
    desc: String,
    author: String,
    liked_count: Option<i64>,
    images: Vec<String>,
}

#[async_trait]
impl Extractor for XiaohongshuExtractor {
    fn platform(&self) -> Platform {
        Platform::Xiaohongshu
    }

    async fn extract(
        &self,
        source: &SourceUrl,
        fetcher: &dyn Fetcher,
    ) -> ExtractResult<RawContent> {
        let note_id = self.resolve_note_id(source, fetcher).await?;
        info!(note_id = %note_id, "extracting xiaohongshu note");

        let url = format!("https://www.xiaohongshu.com/explore/{note_id}");
        let request = FetchRequest::for_platform(url, Platform::Xiaohongshu);
        let response = fetcher.fetch(&request).await.map_err(ExtractError::from)?;
        error_for_status(&response).map_err(ExtractError::from)?;

        if response.final_url.contains("/login")
            || response.body.contains("扫码登录")
            || response.body.contains("手机号登录")
        {
            return Err(ExtractError::blocked(
                "xiaohongshu redirected to its login wall",
                BLOCK_GUIDANCE,
            ));
        }

        let html = &response.body;
        let fields = initial_state(html)
            .and_then(|state| Self::note_from_state(&state, &note_id))
            .unwrap_or_else(|| NoteFields {
                // Meta-tag fallback for pages where the blob is absent
                // or unparseable.
                title: meta_content(html, "og:title").unwrap_or_default(),
                desc: meta_content(html, "og:description")
                    .or_else(|| meta_content(html, "description"))
                    .unwrap_or_default(),
                author: String::new(),
                liked_count: None,
                images: meta_contents(html, "og:image"),
            });

        let mut content = RawContent::new();
        content.push_text(&fields.title);
        content.push_text(&fields.desc);
        for image_url in &fields.images {
            content.push_image(image_url.as_str());
        }

        if !content.has_content() {
            return Err(ExtractError::blocked(
                "note page carried neither text nor images",
                BLOCK_GUIDANCE,
            ));
        }

        if !fields.title.is_empty() {
            content.set_meta("title", fields.title);
        }
        if !fields.author.is_empty() {
            content.set_meta("author", fields.author);
        }
        if !fields.desc.is_empty() {
            content.set_meta("description", fields.desc);
        }
        content.set_meta("note_id", note_id);
        content.set_meta("fetched_at", response.fetched_at.to_rfc3339());
        content.set_meta("image_count", content.images.len() as i64);
        if let Some(likes) = fields.liked_count {
            content.set_meta("like_count", likes);
        }

        Ok(content)
    }
}

//! Douyin video extractor.
//!
//! Douyin is the most aggressively defended platform: short links
//! redirect to the home page for non-browser clients, and video pages
//! frequently serve a verification wall. Blocks are classified as
//! `Blocked` with guidance so the fallback controller can switch to
//! context-assisted extraction instead of retrying into the wall.

use async_trait::async_trait;
use regex::Regex;
use tracing::{info, warn};

use crate::error::{ExtractError, ExtractResult};
use crate::extractors::parse::{inline_json_int, inline_json_str, meta_content, page_title};
use crate::traits::extractor::Extractor;
use crate::traits::fetcher::{error_for_status, FetchRequest, Fetcher};
use crate::types::content::RawContent;
use crate::types::url::{Platform, SourceUrl};

/// Guidance returned with every Douyin block.
const BLOCK_GUIDANCE: &str =
    "douyin served an anti-crawling wall; copy the share text of the video \
     (share button, copy link; the text includes the video description) and \
     pass it as context_text to continue without live scraping";

pub struct DouyinExtractor;

impl DouyinExtractor {
    /// Resolve a short link to a numeric video id.
    async fn resolve_video_id(
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

        for pattern in [
            r"/video/(\d+)",
            r"aweme_id=(\d+)",
            r"item_id=(\d+)",
            r"modal_id=(\d+)",
        ] {
            let re = Regex::new(pattern).unwrap();
            if let Some(cap) = re.captures(&resolved) {
                return Ok(cap[1].to_string());
            }
        }

        // Short links that bounce to the home page are the signature of
        // douyin's bot filter, not a missing video.
        warn!(short = %source.raw, resolved = %resolved, "short link bounced without a video id");
        Err(ExtractError::blocked(
            format!("short link redirected to {resolved} instead of a video page"),
            BLOCK_GUIDANCE,
        ))
    }

    fn looks_blocked(html: &str) -> bool {
        const MARKERS: [&str; 5] = [
            "验证码中间页",
            "请完成验证",
            "登录后查看",
            "security-check",
            "verify.snssdk.com",
        ];
        MARKERS.iter().any(|m| html.contains(m))
    }
}

#[async_trait]
impl Extractor for DouyinExtractor {
    fn platform(&self) -> Platform {
        Platform::Douyin
    }

    async fn extract(
        &self,
        source: &SourceUrl,
        fetcher: &dyn Fetcher,
    ) -> ExtractResult<RawContent> {
        let video_id = self.resolve_video_id(source, fetcher).await?;
        info!(video_id = %video_id, "extracting douyin video");

        let url = format!("https://www.douyin.com/video/{video_id}");
        let request = FetchRequest::for_platform(url, Platform::Douyin);
        let response = fetcher.fetch(&request).await.map_err(ExtractError::from)?;
        error_for_status(&response).map_err(ExtractError::from)?;

        let html = &response.body;
        if Self::looks_blocked(html) {
            return Err(ExtractError::blocked(
                "douyin served a verification page instead of the video",
                BLOCK_GUIDANCE,
            ));
        }

        // Prefer fields from the embedded render JSON, fall back to
        // OpenGraph metas.
        let description = inline_json_str(html, "desc")
            .or_else(|| meta_content(html, "og:description"))
            .or_else(|| meta_content(html, "og:title"))
            .unwrap_or_default();
        let author = inline_json_str(html, "nickname")
            .or_else(|| meta_content(html, "og:author"))
            .unwrap_or_default();

        let mut content = RawContent::new();
        content.push_text(&description);

        if description.trim().is_empty() {
            // A video page without even a description is the silent
            // variant of the wall.
            return Err(ExtractError::blocked(
                "douyin returned a video page with no extractable content",
                BLOCK_GUIDANCE,
            ));
        }

        let title = page_title(html)
            .filter(|t| !t.contains("抖音"))
            .unwrap_or_else(|| description.clone());

        content.set_meta("title", title);
        if !author.is_empty() {
            content.set_meta("author", author);
        }
        content.set_meta("description", description);
        content.set_meta("video_id", video_id);
        content.set_meta("fetched_at", response.fetched_at.to_rfc3339());
        if let Some(likes) = inline_json_int(html, "digg_count") {
            content.set_meta("like_count", likes);
        }
        if let Some(comments) = inline_json_int(html, "comment_count") {
            content.set_meta("comment_count", comments);
        }
        if let Some(shares) = inline_json_int(html, "share_count") {
            content.set_meta("share_count", shares);
        }
        if let Some(created) = inline_json_int(html, "create_time") {
            content.set_meta("publish_time", created);
        }

        Ok(content)
    }
}

//! Bilibili video extractor.
//!
//! Uses the public view API, which returns structured JSON keyed by BV
//! id. Short `b23.tv` links are resolved to the full video URL first.

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ExtractError, ExtractResult};
use crate::traits::extractor::Extractor;
use crate::traits::fetcher::{error_for_status, FetchRequest, Fetcher};
use crate::types::content::RawContent;
use crate::types::url::{Platform, SourceUrl};

const VIEW_API: &str = "https://api.bilibili.com/x/web-interface/view";
const TAGS_API: &str = "https://api.bilibili.com/x/tag/archive/tags";

pub struct BilibiliExtractor;

impl BilibiliExtractor {
    /// Resolve the BV id, following the `b23.tv` redirect when needed.
    async fn resolve_bvid(&self, source: &SourceUrl, fetcher: &dyn Fetcher) -> ExtractResult<String> {
        if !source.is_short_link {
            return Ok(source.canonical_id.clone());
        }

        let resolved = fetcher
            .resolve_redirect(&source.raw)
            .await
            .map_err(ExtractError::from)?;

        let re = Regex::new(r"(BV[A-Za-z0-9]+)").unwrap();
        match re.captures(&resolved) {
            Some(cap) => {
                let bvid = cap[1].to_string();
                debug!(short = %source.raw, bvid = %bvid, "short link resolved to BV id");
                Ok(bvid)
            }
            None => Err(ExtractError::not_found(format!(
                "short link did not resolve to a video page: {resolved}"
            ))),
        }
    }

    /// Map a view-API error code to an extraction error.
    fn api_error(code: i64, message: &str) -> ExtractError {
        match code {
            -404 => ExtractError::not_found(format!("video not found: {message}")),
            -403 | -412 => ExtractError::blocked(
                format!("bilibili risk control rejected the request (code {code}): {message}"),
                "the API refused automated access; supply the video title and description \
                 as context_text to continue without live extraction",
            ),
            _ => ExtractError::transient(format!("view API error code {code}: {message}")),
        }
    }

    /// Best-effort tag fetch; failures are logged and tolerated.
    async fn fetch_tags(&self, bvid: &str, fetcher: &dyn Fetcher) -> Vec<String> {
        let request =
            FetchRequest::for_platform(format!("{TAGS_API}?bvid={bvid}"), Platform::Bilibili);
        let response = match fetcher.fetch(&request).await {
            Ok(r) => r,
            Err(e) => {
                warn!(bvid = %bvid, error = %e, "tag fetch failed");
                return Vec::new();
            }
        };

        let Ok(payload) = serde_json::from_str::<Value>(&response.body) else {
            return Vec::new();
        };
        payload
            .pointer("/data")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(|t| t.pointer("/tag_name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl Extractor for BilibiliExtractor {
    fn platform(&self) -> Platform {
        Platform::Bilibili
    }

    async fn extract(
        &self,
        source: &SourceUrl,
        fetcher: &dyn Fetcher,
    ) -> ExtractResult<RawContent> {
        let bvid = self.resolve_bvid(source, fetcher).await?;
        info!(bvid = %bvid, "extracting bilibili video");

        let request =
            FetchRequest::for_platform(format!("{VIEW_API}?bvid={bvid}"), Platform::Bilibili);
        let response = fetcher.fetch(&request).await.map_err(ExtractError::from)?;
        error_for_status(&response).map_err(ExtractError::from)?;

        let payload: Value = serde_json::from_str(&response.body)
            .map_err(|e| ExtractError::transient(format!("view API returned invalid JSON: {e}")))?;

        let code = payload.pointer("/code").and_then(Value::as_i64).unwrap_or(-1);
        if code != 0 {
            let message = payload
                .pointer("/message")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            return Err(Self::api_error(code, message));
        }

        let data = payload
            .pointer("/data")
            .ok_or_else(|| ExtractError::transient("view API response missing data"))?;

        let title = data
            .pointer("/title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let description = data
            .pointer("/desc")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let author = data
            .pointer("/owner/name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let mut content = RawContent::new();
        content.push_text(&title);
        content.push_text(&description);

        // Multi-part videos: list the parts as one block.
        if let Some(pages) = data.pointer("/pages").and_then(Value::as_array) {
            if pages.len() > 1 {
                let parts: Vec<String> = pages
                    .iter()
                    .filter_map(|p| {
                        let number = p.pointer("/page").and_then(Value::as_i64)?;
                        let part = p.pointer("/part").and_then(Value::as_str)?;
                        Some(format!("P{number}: {part}"))
                    })
                    .collect();
                content.push_text(parts.join("\n"));
            }
        }

        let tags = self.fetch_tags(&bvid, fetcher).await;
        if !tags.is_empty() {
            content.push_text(tags.iter().map(|t| format!("#{t}")).collect::<Vec<_>>().join(" "));
        }

        content.set_meta("title", title);
        content.set_meta("author", author);
        content.set_meta("description", description);
        content.set_meta("bvid", bvid);
        content.set_meta("fetched_at", response.fetched_at.to_rfc3339());
        if let Some(duration) = data.pointer("/duration").and_then(Value::as_i64) {
            content.set_meta("duration", duration);
        }
        if let Some(pubdate) = data.pointer("/pubdate").and_then(Value::as_i64) {
            content.set_meta("publish_time", pubdate);
        }
        if let Some(views) = data.pointer("/stat/view").and_then(Value::as_i64) {
            content.set_meta("view_count", views);
        }
        if let Some(likes) = data.pointer("/stat/like").and_then(Value::as_i64) {
            content.set_meta("like_count", likes);
        }
        if let Some(cover) = data.pointer("/pic").and_then(Value::as_str) {
            content.set_meta("cover_url", cover);
        }
        if !tags.is_empty() {
            content.set_meta("tags", tags.join(", "));
        }

        if !content.has_content() {
            return Err(ExtractError::transient(
                "view API returned an empty video record",
            ));
        }

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;
    use crate::traits::fetcher::FetchResponse;

    fn view_response(bvid: &str) -> String {
        serde_json::json!({
            "code": 0,
            "message": "0",
            "data": {
                "title": "Rust 入门教程",
                "desc": "从零开始学习 Rust 编程语言。",
                "duration": 600,
                "pubdate": 1700000000,
                "owner": {"name": "up主"},
                "stat": {"view": 12345, "like": 678},
                "pic": "https://i0.hdslb.com/cover.jpg",
                "pages": [
                    {"page": 1, "part": "安装"},
                    {"page": 2, "part": "所有权"}
                ],
                "bvid": bvid
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_extracts_view_api_payload() {
        let fetcher = MockFetcher::new()
            .with_response(
                format!("{VIEW_API}?bvid=BV1xx411c7mD"),
                FetchResponse::ok(view_response("BV1xx411c7mD"), VIEW_API),
            )
            .with_response(
                format!("{TAGS_API}?bvid=BV1xx411c7mD"),
                FetchResponse::ok(
                    r#"{"code":0,"data":[{"tag_name":"编程"},{"tag_name":"Rust"}]}"#,
                    TAGS_API,
                ),
            );

        let source = SourceUrl::new(
            "https://www.bilibili.com/video/BV1xx411c7mD",
            Platform::Bilibili,
            "BV1xx411c7mD",
        );
        let content = BilibiliExtractor
            .extract(&source, &fetcher)
            .await
            .unwrap();

        assert!(content.has_native_text());
        assert_eq!(
            content.metadata.get("title").and_then(|v| v.as_str()),
            Some("Rust 入门教程")
        );
        assert_eq!(
            content.metadata.get("view_count").and_then(|v| v.as_i64()),
            Some(12345)
        );
        // Multi-part listing and tag line both present
        assert!(content.text_blocks.iter().any(|b| b.text.contains("P2")));
        assert!(content.text_blocks.iter().any(|b| b.text.contains("#Rust")));
    }

    #[tokio::test]
    async fn test_api_error_codes() {
        assert_eq!(
            BilibiliExtractor::api_error(-404, "gone").kind,
            crate::error::ErrorKind::NotFound
        );
        let blocked = BilibiliExtractor::api_error(-412, "risk control");
        assert_eq!(blocked.kind, crate::error::ErrorKind::Blocked);
        assert!(blocked.guidance.is_some());
    }

    #[tokio::test]
    async fn test_short_link_resolution() {
        let fetcher = MockFetcher::new()
            .with_redirect(
                "https://b23.tv/abc123",
                "https://www.bilibili.com/video/BV1xx411c7mD?from=share",
            )
            .with_response(
                format!("{VIEW_API}?bvid=BV1xx411c7mD"),
                FetchResponse::ok(view_response("BV1xx411c7mD"), VIEW_API),
            );

        let source = SourceUrl::new("https://b23.tv/abc123", Platform::Bilibili, "abc123")
            .short_link();
        let content = BilibiliExtractor
            .extract(&source, &fetcher)
            .await
            .unwrap();
        assert_eq!(
            content.metadata.get("bvid").and_then(|v| v.as_str()),
            Some("BV1xx411c7mD")
        );
    }
}

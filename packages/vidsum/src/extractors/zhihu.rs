//! Zhihu extractor for answers, questions, articles, and pins.
//!
//! All four content kinds embed their data in `__INITIAL_STATE__`; the
//! rich-text bodies are HTML and get stripped to plain text here so the
//! normalizer sees clean paragraphs.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::error::{ExtractError, ExtractResult};
use crate::extractors::parse::{initial_state, meta_content, page_title, strip_html};
use crate::traits::extractor::Extractor;
use crate::traits::fetcher::{error_for_status, FetchRequest, Fetcher};
use crate::types::content::RawContent;
use crate::types::url::{Platform, SourceUrl};

const BLOCK_GUIDANCE: &str =
    "zhihu served a verification page; copy the answer or article text from \
     the app or a logged-in browser session and pass it as context_text";

/// Which kind of Zhihu resource a URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentKind {
    /// `question/{qid}/answer/{aid}` - canonical id is `qid-aid`
    Answer,
    Question,
    Article,
    Pin,
}

pub struct ZhihuExtractor;

impl ZhihuExtractor {
    fn content_kind(source: &SourceUrl) -> ContentKind {
        if source.raw.contains("/answer/") {
            ContentKind::Answer
        } else if source.raw.contains("zhuanlan.zhihu.com") {
            ContentKind::Article
        } else if source.raw.contains("/pin/") {
            ContentKind::Pin
        } else {
            ContentKind::Question
        }
    }

    /// Pull the title and body out of the state blob for the given kind.
    fn fields_from_state(
        state: &Value,
        kind: ContentKind,
        canonical_id: &str,
    ) -> Option<(String, String, Option<String>, Option<i64>)> {
        match kind {
            ContentKind::Answer => {
                let answer_id = canonical_id.split('-').nth(1)?;
                let answer = state.pointer(&format!("/entities/answers/{answer_id}"))?;
                let title = answer
                    .pointer("/question/title")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let body = strip_html(
                    answer.pointer("/content").and_then(Value::as_str).unwrap_or_default(),
                );
                let author = answer
                    .pointer("/author/name")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let votes = answer.pointer("/voteupCount").and_then(Value::as_i64);
                Some((title, body, author, votes))
            }
            ContentKind::Question => {
                let question = state.pointer(&format!("/entities/questions/{canonical_id}"))?;
                let title = question
                    .pointer("/title")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let body = strip_html(
                    question
                        .pointer("/detail")
                        .and_then(Value::as_str)
                        .unwrap_or_default(),
                );
                Some((title, body, None, None))
            }
            ContentKind::Article => {
                let article = state.pointer(&format!("/entities/articles/{canonical_id}"))?;
                let title = article
                    .pointer("/title")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let body = strip_html(
                    article.pointer("/content").and_then(Value::as_str).unwrap_or_default(),
                );
                let author = article
                    .pointer("/author/name")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let votes = article.pointer("/voteupCount").and_then(Value::as_i64);
                Some((title, body, author, votes))
            }
            ContentKind::Pin => {
                let pin = state.pointer(&format!("/entities/pins/{canonical_id}"))?;
                let body = strip_html(
                    pin.pointer("/contentHtml")
                        .or_else(|| pin.pointer("/content"))
                        .and_then(Value::as_str)
                        .unwrap_or_default(),
                );
                let author = pin
                    .pointer("/author/name")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Some((String::new(), body, author, None))
            }
        }
    }
}

#[async_trait]
impl Extractor for ZhihuExtractor {
    fn platform(&self) -> Platform {
        Platform::Zhihu
    }

    async fn extract(
        &self,
        source: &SourceUrl,
        fetcher: &dyn Fetcher,
    ) -> ExtractResult<RawContent> {
        let kind = Self::content_kind(source);
        info!(canonical_id = %source.canonical_id, kind = ?kind, "extracting zhihu content");

        let request = FetchRequest::for_platform(source.raw.clone(), Platform::Zhihu);
        let response = fetcher.fetch(&request).await.map_err(ExtractError::from)?;
        error_for_status(&response).map_err(ExtractError::from)?;

        let html = &response.body;
        if html.contains("安全验证") || html.contains("unhuman") {
            return Err(ExtractError::blocked(
                "zhihu served its verification wall",
                BLOCK_GUIDANCE,
            ));
        }

        let (mut title, body, author, votes) = initial_state(html)
            .and_then(|state| Self::fields_from_state(&state, kind, &source.canonical_id))
            .unwrap_or_else(|| {
                let title = meta_content(html, "og:title")
                    .or_else(|| page_title(html))
                    .unwrap_or_default();
                let body = meta_content(html, "og:description").unwrap_or_default();
                (title, body, None, None)
            });

        // Pins have no title of their own; synthesize from the body.
        if title.is_empty() {
            title = body.chars().take(40).collect();
        }

        let mut content = RawContent::new();
        content.push_text(&title);
        content.push_text(&body);

        if !content.has_native_text() {
            return Err(ExtractError::transient(
                "zhihu page carried no extractable text",
            ));
        }

        content.set_meta("title", title);
        if let Some(author) = author {
            content.set_meta("author", author);
        }
        if let Some(votes) = votes {
            content.set_meta("voteup_count", votes);
        }
        content.set_meta("fetched_at", response.fetched_at.to_rfc3339());
        content.set_meta(
            "content_kind",
            match kind {
                ContentKind::Answer => "answer",
                ContentKind::Question => "question",
                ContentKind::Article => "article",
                ContentKind::Pin => "pin",
            },
        );

        Ok(content)
    }
}

//! Fetcher trait - the network collaborator.
//!
//! Extractors never touch HTTP directly; they go through a `Fetcher` so
//! tests can substitute a deterministic mock and so platform request
//! strategies (headers, pacing) live in one place.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{FetchError, FetchResult};
use crate::types::url::Platform;

/// A single outbound request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,

    /// Lets the fetcher apply platform-specific request strategy
    /// (user agent, referer, pacing). `None` for neutral requests.
    pub platform: Option<Platform>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            platform: None,
        }
    }

    pub fn for_platform(url: impl Into<String>, platform: Platform) -> Self {
        Self {
            url: url.into(),
            platform: Some(platform),
        }
    }
}

/// A fetched response body.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,

    /// URL after redirects.
    pub final_url: String,

    pub content_type: Option<String>,

    /// When the content was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl FetchResponse {
    pub fn ok(body: impl Into<String>, final_url: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            final_url: final_url.into(),
            content_type: Some("text/html".into()),
            fetched_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The network collaborator capability.
///
/// Implementations must not retry internally; retry policy is owned by
/// the fallback controller.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a text resource (HTML page or JSON API payload).
    async fn fetch(&self, request: &FetchRequest) -> FetchResult<FetchResponse>;

    /// Fetch a binary resource (an image to be OCR'd).
    async fn fetch_bytes(&self, request: &FetchRequest) -> FetchResult<Vec<u8>>;

    /// Follow redirects for a short link and return the final URL.
    async fn resolve_redirect(&self, url: &str) -> FetchResult<String>;

    /// Implementation name, for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}

/// Map a non-success response into a `FetchError::Status`.
pub fn error_for_status(response: &FetchResponse) -> FetchResult<()> {
    if response.is_success() {
        Ok(())
    } else {
        Err(FetchError::Status {
            code: response.status,
            url: response.final_url.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_for_status() {
        let ok = FetchResponse::ok("body", "https://example.com");
        assert!(error_for_status(&ok).is_ok());

        let not_found = FetchResponse {
            status: 404,
            ..FetchResponse::ok("", "https://example.com/missing")
        };
        assert!(matches!(
            error_for_status(&not_found),
            Err(FetchError::Status { code: 404, .. })
        ));
    }
}

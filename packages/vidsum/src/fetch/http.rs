//! Default HTTP fetcher backed by `reqwest`.
//!
//! Applies per-platform request strategies (headers, pacing) and
//! resolves short-link redirects. Does not retry: retry policy belongs
//! to the fallback controller.

use async_trait::async_trait;
use chrono::Utc;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::RateLimiter;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::fetch::strategy::{default_strategy, strategy_for, PlatformStrategy};
use crate::traits::fetcher::{FetchRequest, FetchResponse, Fetcher};
use crate::types::url::Platform;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// HTTP fetcher with per-platform pacing.
pub struct HttpFetcher {
    client: reqwest::Client,
    limiters: HashMap<Platform, Arc<DirectRateLimiter>>,
    default_limiter: Arc<DirectRateLimiter>,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self::with_client(client)
    }

    /// Use a custom `reqwest` client (proxy, custom TLS, shorter
    /// timeouts).
    pub fn with_client(client: reqwest::Client) -> Self {
        let limiters = Platform::ALL
            .iter()
            .map(|&platform| {
                let quota = strategy_for(platform).quota;
                (platform, Arc::new(RateLimiter::direct(quota)))
            })
            .collect();

        Self {
            client,
            limiters,
            default_limiter: Arc::new(RateLimiter::direct(default_strategy().quota)),
        }
    }

    fn strategy(&self, platform: Option<Platform>) -> PlatformStrategy {
        platform.map(strategy_for).unwrap_or_else(default_strategy)
    }

    async fn wait_for_permit(&self, platform: Option<Platform>) {
        let limiter = platform
            .and_then(|p| self.limiters.get(&p))
            .unwrap_or(&self.default_limiter);
        limiter.until_ready().await;
    }

    fn build_request(
        &self,
        request: &FetchRequest,
        strategy: &PlatformStrategy,
    ) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .get(&request.url)
            .header("User-Agent", strategy.user_agent)
            .header("Accept-Language", strategy.accept_language);
        if let Some(referer) = strategy.referer {
            builder = builder.header("Referer", referer);
        }
        builder
    }

    fn map_send_error(url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Transport(Box::new(err))
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> FetchResult<FetchResponse> {
        let parsed = url::Url::parse(&request.url).map_err(|_| FetchError::InvalidUrl {
            url: request.url.clone(),
        })?;

        self.wait_for_permit(request.platform).await;
        let strategy = self.strategy(request.platform);

        debug!(
            url = %request.url,
            host = parsed.host_str().unwrap_or(""),
            platform = ?request.platform,
            "HTTP fetch starting"
        );

        let response = self
            .build_request(request, &strategy)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8",
            )
            .send()
            .await
            .map_err(|e| {
                warn!(url = %request.url, error = %e, "HTTP request failed");
                Self::map_send_error(&request.url, e)
            })?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response
            .text()
            .await
            .map_err(|e| Self::map_send_error(&request.url, e))?;

        Ok(FetchResponse {
            status,
            body,
            final_url,
            content_type,
            fetched_at: Utc::now(),
        })
    }

    async fn fetch_bytes(&self, request: &FetchRequest) -> FetchResult<Vec<u8>> {
        self.wait_for_permit(request.platform).await;
        let strategy = self.strategy(request.platform);

        let response = self
            .build_request(request, &strategy)
            .header("Accept", "image/webp,image/apng,image/*,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| Self::map_send_error(&request.url, e))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(FetchError::Status {
                code: status,
                url: request.url.clone(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::map_send_error(&request.url, e))?;
        Ok(bytes.to_vec())
    }

    async fn resolve_redirect(&self, url: &str) -> FetchResult<String> {
        // reqwest follows redirects by default; the response URL is the
        // final destination.
        let response = self
            .client
            .get(url)
            .header("User-Agent", default_strategy().user_agent)
            .send()
            .await
            .map_err(|e| Self::map_send_error(url, e))?;

        let final_url = response.url().to_string();
        debug!(original = %url, resolved = %final_url, "short link resolved");
        Ok(final_url)
    }

    fn name(&self) -> &str {
        "http"
    }
}

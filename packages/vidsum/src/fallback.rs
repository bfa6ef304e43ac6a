//! Fallback controller - retry, backoff, and context-assisted degradation.
//!
//! Wraps extractor invocation in an explicit state machine:
//!
//! ```text
//! Primary -> Retrying -> ContextAssisted -> Failed | Succeeded
//! ```
//!
//! Retry policy lives here and only here; extractors never retry
//! internally, so the policy stays testable independent of any
//! platform's scraping quirks.

use rand::Rng;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use crate::error::{ErrorKind, ExtractError, ExtractResult};
use crate::traits::extractor::Extractor;
use crate::traits::fetcher::Fetcher;
use crate::types::config::{RetryConfig, TimeoutConfig};
use crate::types::content::{ExtractionMode, RawContent};
use crate::types::url::{Platform, SourceUrl};

/// States of one fallback run. Carried in logs; the terminal state is
/// implied by the returned result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackState {
    /// First extraction attempt.
    Primary,

    /// Retrying after a transient or rate-limit failure.
    Retrying { attempt: usize },

    /// Building content from caller-supplied context after a block.
    ContextAssisted,

    Succeeded,
    Failed,
}

/// Retry/backoff/degradation policy around one extractor.
pub struct FallbackController<'a> {
    retry: &'a RetryConfig,
    timeouts: &'a TimeoutConfig,
}

impl<'a> FallbackController<'a> {
    pub fn new(retry: &'a RetryConfig, timeouts: &'a TimeoutConfig) -> Self {
        Self { retry, timeouts }
    }

    /// Run extraction to a terminal state.
    ///
    /// On success the returned content carries the mode that produced
    /// it (`Primary` or `ContextAssisted`), used downstream for
    /// confidence weighting.
    pub async fn run(
        &self,
        extractor: &dyn Extractor,
        fetcher: &dyn Fetcher,
        source: &SourceUrl,
        context_text: Option<&str>,
    ) -> ExtractResult<RawContent> {
        let platform = extractor.platform();
        let mut attempt = 1usize;
        let mut backoff = Duration::from_millis(self.retry.initial_backoff_ms);
        let mut state = FallbackState::Primary;

        loop {
            info!(platform = %platform, state = ?state, attempt, "extraction attempt");

            let attempt_result = match timeout(
                self.timeouts.fetch_timeout(),
                extractor.extract(source, fetcher),
            )
            .await
            {
                Ok(result) => result,
                // A stage timeout is a transient failure, handled by the
                // retry policy rather than propagated raw.
                Err(_) => Err(ExtractError::transient(format!(
                    "extraction attempt exceeded {}s",
                    self.timeouts.fetch_timeout_secs
                ))),
            };

            match attempt_result {
                Ok(mut content) => {
                    content.extraction_mode = ExtractionMode::Primary;
                    info!(platform = %platform, attempts = attempt, state = ?FallbackState::Succeeded, "extraction succeeded");
                    return Ok(content);
                }
                Err(err) if err.kind == ErrorKind::Blocked => {
                    return self.handle_blocked(err, context_text, platform);
                }
                Err(err) if err.is_retryable() && attempt < self.retry.max_attempts => {
                    state = FallbackState::Retrying { attempt };
                    warn!(
                        platform = %platform,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "extraction failed, retrying"
                    );
                    sleep(jittered(backoff)).await;
                    backoff = std::cmp::min(
                        backoff * 2,
                        Duration::from_millis(self.retry.max_backoff_ms),
                    );
                    attempt += 1;
                }
                Err(err) => {
                    // NotFound is terminal immediately; retryable kinds
                    // land here once the bound is exhausted.
                    warn!(
                        platform = %platform,
                        attempts = attempt,
                        kind = %err.kind,
                        state = ?FallbackState::Failed,
                        "extraction failed terminally"
                    );
                    return Err(err);
                }
            }
        }
    }

    /// A block is not transient: either degrade to context-assisted
    /// extraction or fail with guidance for the caller.
    fn handle_blocked(
        &self,
        mut err: ExtractError,
        context_text: Option<&str>,
        platform: Platform,
    ) -> ExtractResult<RawContent> {
        match context_text.map(str::trim).filter(|c| !c.is_empty()) {
            Some(context) => {
                info!(
                    platform = %platform,
                    state = ?FallbackState::ContextAssisted,
                    "extraction blocked, using caller-supplied context"
                );
                Ok(RawContent::from_context(context))
            }
            None => {
                err.guidance.get_or_insert_with(|| {
                    "extraction was blocked by anti-crawling countermeasures; \
                     supply the post's shared text as context_text and retry"
                        .to_string()
                });
                warn!(platform = %platform, state = ?FallbackState::Failed, "blocked with no context available");
                Err(err)
            }
        }
    }
}

/// Randomize a backoff interval (0.8x to 1.2x) so concurrent runs don't
/// synchronize their retries.
fn jittered(base: Duration) -> Duration {
    let factor = rand::thread_rng().gen_range(0.8..1.2);
    base.mul_f64(factor)
}

//! Configuration types for the pipeline.
//!
//! All thresholds named in the component contracts live here, with
//! defaults matching the documented behavior and environment overrides
//! for deployment tuning (`VIDSUM_*` variables).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy applied by the fallback controller to transient and
/// rate-limited extraction failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first (so 3 = one try, two retries).
    pub max_attempts: usize,

    /// Backoff before the first retry, in milliseconds.
    pub initial_backoff_ms: u64,

    /// Backoff ceiling, in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 10_000,
        }
    }
}

/// OCR merge policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Results below this confidence are dropped (counted, not merged).
    pub min_confidence: f32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.6,
        }
    }
}

/// Acceptance thresholds for the quality controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Graphs whose mean node confidence falls below this are degraded.
    pub min_mean_confidence: f32,

    /// Minimum token count for a body segment to become a claim. A CJK
    /// character counts as one token, a latin word as one token.
    pub min_claim_tokens: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_mean_confidence: 0.5,
            min_claim_tokens: 8,
        }
    }
}

/// Timeouts for network-bound stages. Exceeding one yields a transient
/// error handled by the retry policy, never a raw timeout error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Bound on one extraction attempt (all fetches it performs).
    pub fetch_timeout_secs: u64,

    /// Bound on the batched OCR call.
    pub ocr_timeout_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 30,
            ocr_timeout_secs: 60,
        }
    }
}

impl TimeoutConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn ocr_timeout(&self) -> Duration {
        Duration::from_secs(self.ocr_timeout_secs)
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub retry: RetryConfig,
    pub ocr: OcrConfig,
    pub quality: QualityConfig,
    pub timeouts: TimeoutConfig,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_ocr(mut self, ocr: OcrConfig) -> Self {
        self.ocr = ocr;
        self
    }

    pub fn with_quality(mut self, quality: QualityConfig) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Defaults overridden by `VIDSUM_*` environment variables.
    ///
    /// Unparseable values are ignored in favor of the default rather
    /// than failing startup.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(n) = env_parse::<usize>("VIDSUM_MAX_ATTEMPTS") {
            config.retry.max_attempts = n;
        }
        if let Some(n) = env_parse::<u64>("VIDSUM_INITIAL_BACKOFF_MS") {
            config.retry.initial_backoff_ms = n;
        }
        if let Some(n) = env_parse::<u64>("VIDSUM_MAX_BACKOFF_MS") {
            config.retry.max_backoff_ms = n;
        }
        if let Some(n) = env_parse::<f32>("VIDSUM_OCR_MIN_CONFIDENCE") {
            config.ocr.min_confidence = n;
        }
        if let Some(n) = env_parse::<f32>("VIDSUM_MIN_MEAN_CONFIDENCE") {
            config.quality.min_mean_confidence = n;
        }
        if let Some(n) = env_parse::<usize>("VIDSUM_MIN_CLAIM_TOKENS") {
            config.quality.min_claim_tokens = n;
        }
        if let Some(n) = env_parse::<u64>("VIDSUM_FETCH_TIMEOUT_SECS") {
            config.timeouts.fetch_timeout_secs = n;
        }
        if let Some(n) = env_parse::<u64>("VIDSUM_OCR_TIMEOUT_SECS") {
            config.timeouts.ocr_timeout_secs = n;
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.ocr.min_confidence, 0.6);
        assert_eq!(config.quality.min_mean_confidence, 0.5);
        assert_eq!(config.timeouts.fetch_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_builders() {
        let config = PipelineConfig::new().with_retry(RetryConfig {
            max_attempts: 5,
            initial_backoff_ms: 100,
            max_backoff_ms: 1_000,
        });
        assert_eq!(config.retry.max_attempts, 5);
    }
}

//! Typed errors for the extraction-and-synthesis pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// How an extraction attempt failed.
///
/// The kind decides the fallback policy: `Transient` and `RateLimited`
/// are retried, `Blocked` triggers context-assisted extraction, and
/// `NotFound` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Anti-crawling countermeasure hit (login wall, signature check,
    /// risk-control page). Not transient: retrying re-hits the wall.
    Blocked,

    /// The content does not exist or was removed.
    NotFound,

    /// The platform throttled us.
    RateLimited,

    /// Network-level failure or timeout; worth retrying.
    Transient,
}

impl ErrorKind {
    /// Whether the fallback controller should retry this kind.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Transient | ErrorKind::RateLimited)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Blocked => "blocked",
            ErrorKind::NotFound => "not found",
            ErrorKind::RateLimited => "rate limited",
            ErrorKind::Transient => "transient",
        };
        f.write_str(s)
    }
}

/// An extraction failure, classified by [`ErrorKind`].
///
/// `Blocked` errors always carry `guidance`: a human-actionable hint
/// telling the caller how to work around the block (typically: supply
/// the share text as `context_text`).
#[derive(Debug, Clone, Error)]
#[error("extraction failed ({kind}): {message}")]
pub struct ExtractError {
    pub kind: ErrorKind,
    pub message: String,
    pub guidance: Option<String>,
}

impl ExtractError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            guidance: None,
        }
    }

    /// An anti-crawling block with caller guidance.
    pub fn blocked(message: impl Into<String>, guidance: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Blocked,
            message: message.into(),
            guidance: Some(guidance.into()),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimited, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transient, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<FetchError> for ExtractError {
    fn from(err: FetchError) -> Self {
        match &err {
            FetchError::Status { code: 404, url } => {
                Self::not_found(format!("HTTP 404 for {url}"))
            }
            FetchError::Status { code: 429, url } => {
                Self::rate_limited(format!("HTTP 429 for {url}"))
            }
            FetchError::Status { code, url } if *code == 403 || *code == 412 => Self::blocked(
                format!("HTTP {code} for {url}"),
                "the platform rejected the request as automated traffic; \
                 supply the shared text of the post as context_text to continue without scraping",
            ),
            _ => Self::transient(err.to_string()),
        }
    }
}

/// Errors from the URL classifier.
#[derive(Debug, Clone, Error)]
pub enum ClassifyError {
    /// The URL matches none of the supported platform patterns.
    #[error("unsupported platform: {url}")]
    UnsupportedPlatform { url: String },
}

/// Errors from the network collaborator.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connection, TLS, body read)
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The request exceeded the configured timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Non-success HTTP status
    #[error("HTTP {code} for {url}")]
    Status { code: u16, url: String },

    /// URL could not be parsed
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
}

/// Errors from the OCR collaborator.
///
/// OCR failures never abort the pipeline; they degrade content and are
/// reflected in warnings or `ExtractionMode::Partial`.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The engine itself failed
    #[error("OCR engine error: {0}")]
    Engine(String),

    /// The batched recognize call exceeded the configured timeout
    #[error("OCR call timed out")]
    Timeout,
}

/// Errors from building or mutating a knowledge graph.
#[derive(Debug, Clone, Error)]
pub enum GraphError {
    /// An edge referenced a node id not present in the graph
    #[error("edge endpoint not in graph: {id}")]
    MissingEndpoint { id: String },

    /// A self-loop with a relation other than `DerivedFrom`
    #[error("self-loop not allowed for relation {relation}")]
    InvalidSelfLoop { relation: String },
}

/// Result type alias for extraction operations.
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::Transient.is_retryable());
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(!ErrorKind::Blocked.is_retryable());
        assert!(!ErrorKind::NotFound.is_retryable());
    }

    #[test]
    fn test_blocked_carries_guidance() {
        let err = ExtractError::blocked("login wall", "supply context_text");
        assert_eq!(err.kind, ErrorKind::Blocked);
        assert!(err.guidance.as_deref().unwrap().contains("context_text"));
    }

    #[test]
    fn test_fetch_error_mapping() {
        let not_found: ExtractError = FetchError::Status {
            code: 404,
            url: "https://example.com".into(),
        }
        .into();
        assert_eq!(not_found.kind, ErrorKind::NotFound);

        let throttled: ExtractError = FetchError::Status {
            code: 429,
            url: "https://example.com".into(),
        }
        .into();
        assert_eq!(throttled.kind, ErrorKind::RateLimited);

        let blocked: ExtractError = FetchError::Status {
            code: 403,
            url: "https://example.com".into(),
        }
        .into();
        assert_eq!(blocked.kind, ErrorKind::Blocked);
        assert!(blocked.guidance.is_some());

        let timeout: ExtractError = FetchError::Timeout {
            url: "https://example.com".into(),
        }
        .into();
        assert_eq!(timeout.kind, ErrorKind::Transient);
    }
}

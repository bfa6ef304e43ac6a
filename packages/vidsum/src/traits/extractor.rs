//! Extractor trait - one implementation per supported platform.

use async_trait::async_trait;

use crate::error::ExtractResult;
use crate::traits::fetcher::Fetcher;
use crate::types::content::RawContent;
use crate::types::url::{Platform, SourceUrl};

/// Platform content extractor capability.
///
/// Contract:
/// - On success, at least one of `text_blocks` / `images` is populated.
/// - Failures are classified into an `ErrorKind`; `Blocked` means an
///   anti-crawling countermeasure and must carry guidance.
/// - No internal retry: retry policy is centralized in the fallback
///   controller so it stays testable independent of platform quirks.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// The platform this extractor serves.
    fn platform(&self) -> Platform;

    /// Fetch and convert platform data into a normalized raw record.
    async fn extract(&self, source: &SourceUrl, fetcher: &dyn Fetcher)
        -> ExtractResult<RawContent>;
}

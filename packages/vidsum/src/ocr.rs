//! OCR adapter - merges recognized image text into raw content.
//!
//! Invoked only when the extracted content carries images (in practice:
//! Xiaohongshu notes). All images of one run go to the OCR collaborator
//! in a single batched call to bound latency and rate-limit exposure.
//! OCR failures never abort the pipeline; they degrade the content.

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::traits::fetcher::{FetchRequest, Fetcher};
use crate::traits::ocr::OcrEngine;
use crate::types::config::{OcrConfig, TimeoutConfig};
use crate::types::content::{ExtractionMode, RawContent, TextBlock};
use crate::types::url::Platform;

/// What happened during one OCR merge, for warning construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OcrOutcome {
    /// Results merged into the text blocks.
    pub merged: usize,

    /// Results dropped for falling below the confidence threshold.
    /// Dropped silently by design, but counted.
    pub dropped_low_confidence: usize,

    /// Images that could not be downloaded for recognition.
    pub failed_downloads: usize,

    /// The batched recognize call itself failed or timed out.
    pub engine_failed: bool,
}

impl OcrOutcome {
    /// Warnings the pipeline should surface. Below-threshold drops are
    /// not failures and produce none.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.engine_failed {
            warnings.push("OCR failed; image text was not recognized".to_string());
        }
        if self.failed_downloads > 0 {
            warnings.push(format!(
                "{} image(s) could not be downloaded for OCR",
                self.failed_downloads
            ));
        }
        warnings
    }
}

/// Batches image recognition and merges the results.
pub struct OcrAdapter<'a> {
    config: &'a OcrConfig,
    timeouts: &'a TimeoutConfig,
}

impl<'a> OcrAdapter<'a> {
    pub fn new(config: &'a OcrConfig, timeouts: &'a TimeoutConfig) -> Self {
        Self { config, timeouts }
    }

    /// Download the content's images, recognize them in one batch, and
    /// merge above-threshold text into `content.text_blocks` with image
    /// provenance.
    pub async fn merge(
        &self,
        content: &mut RawContent,
        platform: Platform,
        ocr: &dyn OcrEngine,
        fetcher: &dyn Fetcher,
    ) -> OcrOutcome {
        let mut outcome = OcrOutcome::default();
        if content.images.is_empty() {
            return outcome;
        }

        let mut image_bytes = Vec::with_capacity(content.images.len());
        for image in &content.images {
            let request = FetchRequest::for_platform(image.url.clone(), platform);
            match fetcher.fetch_bytes(&request).await {
                Ok(bytes) => image_bytes.push(bytes),
                Err(e) => {
                    warn!(url = %image.url, error = %e, "image download failed");
                    outcome.failed_downloads += 1;
                }
            }
        }

        if image_bytes.is_empty() {
            self.mark_partial_if_empty(content);
            return outcome;
        }

        let results = match timeout(self.timeouts.ocr_timeout(), ocr.recognize(&image_bytes)).await
        {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => {
                warn!(error = %e, "OCR engine failed");
                outcome.engine_failed = true;
                self.mark_partial_if_empty(content);
                return outcome;
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.timeouts.ocr_timeout_secs,
                    "OCR call timed out"
                );
                outcome.engine_failed = true;
                self.mark_partial_if_empty(content);
                return outcome;
            }
        };

        for result in results {
            if result.text.trim().is_empty() {
                outcome.dropped_low_confidence += 1;
                continue;
            }
            if result.confidence >= self.config.min_confidence {
                content.text_blocks.push(TextBlock::from_image(result.text));
                outcome.merged += 1;
            } else {
                debug!(
                    confidence = result.confidence,
                    threshold = self.config.min_confidence,
                    "dropping low-confidence OCR result"
                );
                outcome.dropped_low_confidence += 1;
            }
        }

        info!(
            merged = outcome.merged,
            dropped = outcome.dropped_low_confidence,
            failed_downloads = outcome.failed_downloads,
            "OCR merge complete"
        );

        self.mark_partial_if_empty(content);
        outcome
    }

    /// Image-only content where every image failed recognition has no
    /// text at all: mark it partial.
    fn mark_partial_if_empty(&self, content: &mut RawContent) {
        if content.text_blocks.is_empty() {
            content.extraction_mode = ExtractionMode::Partial;
        }
    }
}

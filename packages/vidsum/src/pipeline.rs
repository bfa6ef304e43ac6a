//! Pipeline entry point - classify, extract, normalize, build, review,
//! render.
//!
//! One `process_video` call is a sequential chain of suspending stages;
//! every stage may fail and failures surface as structured rejections,
//! never panics. Concurrent calls are independent: the pipeline holds
//! no mutable state.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::classify::classify;
use crate::error::ClassifyError;
use crate::extractors::extractor_for;
use crate::fallback::FallbackController;
use crate::format::{FormatRegistry, RenderContext};
use crate::graph::GraphBuilder;
use crate::normalize::normalize;
use crate::ocr::OcrAdapter;
use crate::quality::{QualityController, Verdict};
use crate::traits::fetcher::Fetcher;
use crate::traits::ocr::OcrEngine;
use crate::types::config::PipelineConfig;
use crate::types::result::{PipelineResult, RejectReason};

/// The extraction-and-synthesis pipeline.
///
/// Owns its collaborators (fetcher, OCR engine) per instance; instances
/// are cheap to construct per caller and never share mutable state.
pub struct Pipeline<F: Fetcher, O: OcrEngine> {
    fetcher: F,
    ocr: O,
    config: PipelineConfig,
    formats: FormatRegistry,
}

impl<F: Fetcher, O: OcrEngine> Pipeline<F, O> {
    pub fn new(fetcher: F, ocr: O) -> Self {
        Self {
            fetcher,
            ocr,
            config: PipelineConfig::default(),
            formats: FormatRegistry::with_defaults(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the format registry (to add custom renderers).
    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = formats;
        self
    }

    /// Process one URL to a terminal result.
    pub async fn process_video(
        &self,
        url: &str,
        output_format: &str,
        context_text: Option<&str>,
    ) -> PipelineResult {
        self.process_video_with_cancel(url, output_format, context_text, &CancellationToken::new())
            .await
    }

    /// Process one URL, honoring host cancellation.
    ///
    /// Cancellation abandons all in-flight network operations and yields
    /// `Rejected { reason: Cancelled }`; a partial graph is never
    /// returned as accepted.
    pub async fn process_video_with_cancel(
        &self,
        url: &str,
        output_format: &str,
        context_text: Option<&str>,
        cancel: &CancellationToken,
    ) -> PipelineResult {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(url = %url, "pipeline cancelled by host");
                PipelineResult::rejected(RejectReason::Cancelled)
            }
            result = self.run(url, output_format, context_text) => result,
        }
    }

    async fn run(
        &self,
        url: &str,
        output_format: &str,
        context_text: Option<&str>,
    ) -> PipelineResult {
        // Resolve the renderer before spending any network budget.
        let Some(renderer) = self.formats.get(output_format) else {
            return PipelineResult::rejected(RejectReason::UnknownFormat {
                format: output_format.to_string(),
            });
        };

        let source = match classify(url) {
            Ok(source) => source,
            Err(ClassifyError::UnsupportedPlatform { url }) => {
                return PipelineResult::rejected(RejectReason::UnsupportedPlatform { url });
            }
        };
        info!(platform = %source.platform, canonical_id = %source.canonical_id, "pipeline run starting");

        let extractor = extractor_for(source.platform);
        let controller = FallbackController::new(&self.config.retry, &self.config.timeouts);
        let mut raw = match controller
            .run(extractor, &self.fetcher, &source, context_text)
            .await
        {
            Ok(raw) => raw,
            Err(err) => {
                return PipelineResult::rejected(RejectReason::from_extract_error(err));
            }
        };

        let mut pipeline_warnings = Vec::new();
        if !raw.images.is_empty() {
            let adapter = OcrAdapter::new(&self.config.ocr, &self.config.timeouts);
            let outcome = adapter
                .merge(&mut raw, source.platform, &self.ocr, &self.fetcher)
                .await;
            pipeline_warnings.extend(outcome.warnings());
        }

        let normalized = normalize(&raw, &source);
        let graph =
            GraphBuilder::new(self.config.quality.min_claim_tokens).build(&normalized);

        let verdict = QualityController::new(&self.config.quality).review(
            &graph,
            normalized.extraction_mode,
            &pipeline_warnings,
        );

        match verdict {
            Verdict::Accepted => {
                let ctx = RenderContext {
                    platform: source.platform,
                    canonical_id: &source.canonical_id,
                    extraction_mode: normalized.extraction_mode,
                    warnings: &[],
                };
                let rendered_output = renderer.render(&graph, &ctx);
                PipelineResult::Accepted {
                    graph,
                    rendered_output,
                }
            }
            Verdict::Degraded { warnings } => {
                let ctx = RenderContext {
                    platform: source.platform,
                    canonical_id: &source.canonical_id,
                    extraction_mode: normalized.extraction_mode,
                    warnings: &warnings,
                };
                let rendered_output = renderer.render(&graph, &ctx);
                PipelineResult::Degraded {
                    graph,
                    rendered_output,
                    warnings,
                }
            }
            Verdict::Rejected { reason } => PipelineResult::rejected(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockFetcher, MockOcr};

    #[tokio::test]
    async fn test_unknown_format_rejected_before_network() {
        let fetcher = MockFetcher::new();
        let pipeline = Pipeline::new(fetcher, MockOcr::new());

        let result = pipeline
            .process_video("https://www.bilibili.com/video/BV1x", "xmind", None)
            .await;

        match result {
            PipelineResult::Rejected {
                reason: RejectReason::UnknownFormat { format },
            } => assert_eq!(format, "xmind"),
            other => panic!("expected unknown-format rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unsupported_platform_rejected() {
        let pipeline = Pipeline::new(MockFetcher::new(), MockOcr::new());
        let result = pipeline
            .process_video("https://www.youtube.com/watch?v=abc", "markdown", None)
            .await;
        assert!(matches!(
            result,
            PipelineResult::Rejected {
                reason: RejectReason::UnsupportedPlatform { .. }
            }
        ));
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_rejects() {
        let pipeline = Pipeline::new(MockFetcher::new(), MockOcr::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = pipeline
            .process_video_with_cancel(
                "https://www.bilibili.com/video/BV1x",
                "markdown",
                None,
                &cancel,
            )
            .await;
        assert!(matches!(
            result,
            PipelineResult::Rejected {
                reason: RejectReason::Cancelled
            }
        ));
    }
}

//! Quality controller - the accept/degrade/reject decision.
//!
//! A pure decision function over the built graph plus the extraction
//! mode; no network, no I/O. Degraded results always carry warnings
//! naming the exact reason, and those warnings always reach the
//! rendered output.

use tracing::info;

use crate::types::config::QualityConfig;
use crate::types::content::ExtractionMode;
use crate::types::graph::KnowledgeGraph;
use crate::types::result::RejectReason;

/// Outcome of a quality review.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accepted,
    Degraded { warnings: Vec<String> },
    Rejected { reason: RejectReason },
}

pub struct QualityController<'a> {
    config: &'a QualityConfig,
}

impl<'a> QualityController<'a> {
    pub fn new(config: &'a QualityConfig) -> Self {
        Self { config }
    }

    /// Review a built graph.
    ///
    /// `pipeline_warnings` carries degradations observed upstream (OCR
    /// failures); any of them forces at least a degraded verdict so no
    /// failure is silently swallowed.
    pub fn review(
        &self,
        graph: &KnowledgeGraph,
        mode: ExtractionMode,
        pipeline_warnings: &[String],
    ) -> Verdict {
        if graph.claim_count() == 0 {
            info!(mode = %mode, "rejecting graph with no claims");
            return Verdict::Rejected {
                reason: RejectReason::InsufficientContent,
            };
        }

        let mut warnings: Vec<String> = pipeline_warnings.to_vec();

        match mode {
            ExtractionMode::Primary => {}
            ExtractionMode::ContextAssisted => {
                warnings.push(
                    "content was built from caller-supplied context (context-assisted \
                     extraction), not live platform data"
                        .to_string(),
                );
            }
            ExtractionMode::Partial => {
                warnings.push("partial extraction: native text was unavailable".to_string());
            }
        }

        let mean = graph.mean_confidence();
        if mean < self.config.min_mean_confidence {
            warnings.push(format!(
                "low mean node confidence {:.2} (minimum {:.2})",
                mean, self.config.min_mean_confidence
            ));
        }

        if warnings.is_empty() {
            info!(mean_confidence = mean, "graph accepted");
            Verdict::Accepted
        } else {
            info!(
                mean_confidence = mean,
                warning_count = warnings.len(),
                "graph degraded"
            );
            Verdict::Degraded { warnings }
        }
    }
}

//! Terminal pipeline result types.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, ExtractError};
use crate::types::graph::KnowledgeGraph;

/// Why a run was rejected.
///
/// Structured so hosts can branch on the cause, with a `Display` that is
/// always human-actionable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    /// The URL matched no supported platform.
    UnsupportedPlatform { url: String },

    /// Extraction failed terminally (blocked without context, not found,
    /// or retries exhausted). `guidance` is present for blocks.
    ExtractionFailed {
        #[serde(rename = "error_kind")]
        kind: ErrorKind,
        message: String,
        guidance: Option<String>,
    },

    /// The built graph had no claims to stand on.
    InsufficientContent,

    /// The caller requested an unregistered output format.
    UnknownFormat { format: String },

    /// The host cancelled the request mid-pipeline.
    Cancelled,
}

impl RejectReason {
    pub fn from_extract_error(err: ExtractError) -> Self {
        RejectReason::ExtractionFailed {
            kind: err.kind,
            message: err.message,
            guidance: err.guidance,
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::UnsupportedPlatform { url } => {
                write!(f, "unsupported platform: {url}")
            }
            RejectReason::ExtractionFailed {
                kind,
                message,
                guidance,
            } => {
                write!(f, "extraction failed ({kind}): {message}")?;
                if let Some(guidance) = guidance {
                    write!(f, ". {guidance}")?;
                }
                Ok(())
            }
            RejectReason::InsufficientContent => {
                f.write_str("insufficient content: no substantive claims could be extracted")
            }
            RejectReason::UnknownFormat { format } => {
                write!(f, "unknown output format: {format}")
            }
            RejectReason::Cancelled => f.write_str("request cancelled by the caller"),
        }
    }
}

/// The terminal artifact of one `process_video` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineResult {
    Accepted {
        graph: KnowledgeGraph,
        rendered_output: String,
    },
    Degraded {
        graph: KnowledgeGraph,
        rendered_output: String,
        warnings: Vec<String>,
    },
    Rejected {
        reason: RejectReason,
    },
}

impl PipelineResult {
    pub fn rejected(reason: RejectReason) -> Self {
        PipelineResult::Rejected { reason }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, PipelineResult::Accepted { .. })
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, PipelineResult::Degraded { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, PipelineResult::Rejected { .. })
    }

    /// The rendered output, if the run produced one.
    pub fn rendered_output(&self) -> Option<&str> {
        match self {
            PipelineResult::Accepted {
                rendered_output, ..
            }
            | PipelineResult::Degraded {
                rendered_output, ..
            } => Some(rendered_output),
            PipelineResult::Rejected { .. } => None,
        }
    }

    pub fn graph(&self) -> Option<&KnowledgeGraph> {
        match self {
            PipelineResult::Accepted { graph, .. } | PipelineResult::Degraded { graph, .. } => {
                Some(graph)
            }
            PipelineResult::Rejected { .. } => None,
        }
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            PipelineResult::Degraded { warnings, .. } => warnings,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_reason_display_includes_guidance() {
        let reason = RejectReason::from_extract_error(ExtractError::blocked(
            "login wall detected",
            "supply context_text with the shared post text",
        ));
        let text = reason.to_string();
        assert!(text.contains("login wall detected"));
        assert!(text.contains("context_text"));
    }

    #[test]
    fn test_result_accessors() {
        let rejected = PipelineResult::rejected(RejectReason::InsufficientContent);
        assert!(rejected.is_rejected());
        assert!(rejected.rendered_output().is_none());
        assert!(rejected.graph().is_none());
        assert!(rejected.warnings().is_empty());
    }
}

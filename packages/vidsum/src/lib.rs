//! Short-Video Content Extraction and Knowledge-Graph Synthesis
//!
//! Takes a URL from one of several short-video/social platforms
//! (Douyin, Bilibili, Xiaohongshu, Zhihu), extracts structured content,
//! and synthesizes a knowledge graph summarizing it - with anti-crawling
//! fallback, OCR merging for image-first notes, and quality control
//! deciding accept / degrade-with-warnings / reject.
//!
//! # Pipeline
//!
//! ```text
//! classify -> fallback(extractor[, ocr]) -> normalize -> graph -> quality -> format
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use vidsum::{HttpFetcher, Pipeline};
//!
//! let pipeline = Pipeline::new(HttpFetcher::new(), my_ocr_engine);
//! let result = pipeline
//!     .process_video("https://www.bilibili.com/video/BV1xx411c7mD", "markdown", None)
//!     .await;
//!
//! if let Some(markdown) = result.rendered_output() {
//!     println!("{markdown}");
//! }
//! ```
//!
//! Blocked platforms degrade instead of failing when the caller supplies
//! the post's share text:
//!
//! ```rust,ignore
//! let result = pipeline
//!     .process_video(douyin_url, "markdown", Some(share_text))
//!     .await;
//! assert!(result.is_degraded()); // context-assisted, never silently accepted
//! ```
//!
//! # Modules
//!
//! - [`classify`] - URL-to-platform classification
//! - [`extractors`] - per-platform extractors and the dispatch registry
//! - [`fallback`] - retry/backoff and context-assisted degradation
//! - [`ocr`] - batched OCR merging for image-first content
//! - [`normalize`] - boilerplate stripping, segmentation, entity heuristics
//! - [`graph`] - knowledge-graph construction with dedup and confidence
//! - [`quality`] - the accept/degrade/reject decision
//! - [`format`] - renderer registry (structured markdown built in)
//! - [`fetch`] - default HTTP fetcher with per-platform strategies
//! - [`testing`] - deterministic mocks for the collaborator seams

pub mod classify;
pub mod error;
pub mod extractors;
pub mod fallback;
pub mod fetch;
pub mod format;
pub mod graph;
pub mod normalize;
pub mod ocr;
pub mod pipeline;
pub mod quality;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{ClassifyError, ErrorKind, ExtractError, FetchError, GraphError, OcrError};
pub use traits::{
    extractor::Extractor,
    fetcher::{FetchRequest, FetchResponse, Fetcher},
    ocr::OcrEngine,
};
pub use types::{
    config::{OcrConfig, PipelineConfig, QualityConfig, RetryConfig, TimeoutConfig},
    content::{
        ExtractionMode, ImageRef, MetaValue, NormalizedContent, OcrResult, RawContent, Segment,
        TextBlock, TextSource,
    },
    graph::{GraphEdge, GraphNode, KnowledgeGraph, NodeType, Relation},
    result::{PipelineResult, RejectReason},
    url::{Platform, SourceUrl},
};

// Re-export the pipeline entry point
pub use pipeline::Pipeline;

// Re-export pipeline components
pub use classify::classify;
pub use extractors::{
    extractor_for, BilibiliExtractor, DouyinExtractor, XiaohongshuExtractor, ZhihuExtractor,
};
pub use fallback::{FallbackController, FallbackState};
pub use fetch::HttpFetcher;
pub use format::{FormatRegistry, MarkdownRenderer, RenderContext, Renderer};
pub use graph::GraphBuilder;
pub use normalize::normalize;
pub use ocr::{OcrAdapter, OcrOutcome};
pub use quality::{QualityController, Verdict};

// Re-export testing utilities
pub use testing::{MockFetcher, MockOcr, ScriptedExtractor};

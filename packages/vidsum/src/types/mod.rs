//! Data model for one pipeline run.
//!
//! Every type here is created and dropped within a single
//! `process_video` invocation; nothing is shared across runs.

pub mod config;
pub mod content;
pub mod graph;
pub mod result;
pub mod url;

pub use config::{OcrConfig, PipelineConfig, QualityConfig, RetryConfig, TimeoutConfig};
pub use content::{
    ExtractionMode, ImageRef, MetaValue, NormalizedContent, OcrResult, RawContent, Segment,
    TextBlock, TextSource,
};
pub use graph::{node_id, GraphEdge, GraphNode, KnowledgeGraph, NodeType, Relation};
pub use result::{PipelineResult, RejectReason};
pub use url::{Platform, SourceUrl};

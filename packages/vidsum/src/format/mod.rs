//! Output formatting - renderer trait and the format registry.
//!
//! `markdown` is the one required format; the registry is the
//! configuration-extensible seam for additional renderers.

pub mod markdown;

pub use markdown::MarkdownRenderer;

use std::collections::HashMap;

use crate::types::content::ExtractionMode;
use crate::types::graph::KnowledgeGraph;
use crate::types::url::Platform;

/// Provenance handed to renderers alongside the graph.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub platform: Platform,
    pub canonical_id: &'a str,
    pub extraction_mode: ExtractionMode,
    pub warnings: &'a [String],
}

/// A graph-to-string renderer for one output format.
pub trait Renderer: Send + Sync {
    /// The format name callers request (e.g. `"markdown"`).
    fn format_name(&self) -> &'static str;

    fn render(&self, graph: &KnowledgeGraph, ctx: &RenderContext) -> String;
}

/// Registry of available renderers, keyed by format name.
pub struct FormatRegistry {
    renderers: HashMap<&'static str, Box<dyn Renderer>>,
}

impl FormatRegistry {
    /// Empty registry, for callers that want full control.
    pub fn new() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /// Registry with the built-in renderers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(MarkdownRenderer));
        registry
    }

    pub fn register(&mut self, renderer: Box<dyn Renderer>) {
        self.renderers.insert(renderer.format_name(), renderer);
    }

    pub fn get(&self, format: &str) -> Option<&dyn Renderer> {
        self.renderers.get(format).map(|renderer| renderer.as_ref())
    }

    /// Registered format names, sorted for stable display.
    pub fn formats(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.renderers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

//! Structured-markdown renderer.
//!
//! The layout keeps provenance visible: which platform the content came
//! from, which extraction mode produced it, and per-node confidence, so
//! the consumer can judge trust. Warnings always render for degraded
//! results.

use std::fmt::Write;

use crate::format::{RenderContext, Renderer};
use crate::types::graph::{KnowledgeGraph, NodeType};

pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn format_name(&self) -> &'static str {
        "markdown"
    }

    fn render(&self, graph: &KnowledgeGraph, ctx: &RenderContext) -> String {
        let mut out = String::new();

        let topic = graph
            .nodes_of_type(NodeType::Topic)
            .next()
            .map(|n| n.label.as_str())
            .unwrap_or("未命名内容");

        let _ = writeln!(out, "# {topic}\n");
        let _ = writeln!(
            out,
            "> 来源: {} `{}` · 提取方式: {}\n",
            ctx.platform, ctx.canonical_id, ctx.extraction_mode
        );

        if !ctx.warnings.is_empty() {
            out.push_str("## 警告\n\n");
            for warning in ctx.warnings {
                let _ = writeln!(out, "- {warning}");
            }
            out.push('\n');
        }

        let entities: Vec<_> = graph.nodes_of_type(NodeType::Entity).collect();
        if !entities.is_empty() {
            out.push_str("## 提及实体\n\n");
            for entity in entities {
                let _ = writeln!(out, "- {} (置信度 {:.2})", entity.label, entity.confidence);
            }
            out.push('\n');
        }

        let claims: Vec<_> = graph.nodes_of_type(NodeType::Claim).collect();
        if !claims.is_empty() {
            out.push_str("## 主要内容\n\n");
            for (index, claim) in claims.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{}. {} (置信度 {:.2})",
                    index + 1,
                    claim.label,
                    claim.confidence
                );
            }
            out.push('\n');
        }

        if !graph.edges().is_empty() {
            out.push_str("## 知识点关系\n\n");
            for edge in graph.edges() {
                let from = graph.node(&edge.from_id).map(|n| n.label.as_str());
                let to = graph.node(&edge.to_id).map(|n| n.label.as_str());
                if let (Some(from), Some(to)) = (from, to) {
                    let _ = writeln!(
                        out,
                        "- `{}` {} `{}`",
                        truncate(from, 40),
                        edge.relation,
                        truncate(to, 40)
                    );
                }
            }
            out.push('\n');
        }

        out.push_str("---\n\n## 元数据\n\n");
        let _ = writeln!(out, "- **platform**: {}", ctx.platform);
        let _ = writeln!(out, "- **canonical_id**: {}", ctx.canonical_id);
        let _ = writeln!(out, "- **extraction_mode**: {}", ctx.extraction_mode);
        let _ = writeln!(out, "- **nodes**: {}", graph.node_count());
        let _ = writeln!(out, "- **edges**: {}", graph.edge_count());
        let _ = writeln!(out, "- **mean_confidence**: {:.2}", graph.mean_confidence());

        out
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut truncated: String = text.chars().take(max_chars).collect();
        truncated.push('…');
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::content::ExtractionMode;
    use crate::types::graph::Relation;
    use crate::types::url::Platform;

    fn sample_graph() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        let source = graph.upsert_node(NodeType::Source, "bilibili:BV1x", 1.0);
        let topic = graph.upsert_node(NodeType::Topic, "Rust 入门", 1.0);
        graph
            .add_edge(&topic, &source, Relation::DerivedFrom, 1.0)
            .unwrap();
        let entity = graph.upsert_node(NodeType::Entity, "Rust", 1.0);
        graph
            .add_edge(&topic, &entity, Relation::Mentions, 1.0)
            .unwrap();
        let claim = graph.upsert_node(NodeType::Claim, "所有权是核心概念。", 1.0);
        graph
            .add_edge(&claim, &topic, Relation::RelatesTo, 1.0)
            .unwrap();
        graph
            .add_edge(&claim, &source, Relation::DerivedFrom, 1.0)
            .unwrap();
        graph
    }

    #[test]
    fn test_renders_all_sections() {
        let graph = sample_graph();
        let ctx = RenderContext {
            platform: Platform::Bilibili,
            canonical_id: "BV1x",
            extraction_mode: ExtractionMode::Primary,
            warnings: &[],
        };
        let output = MarkdownRenderer.render(&graph, &ctx);

        assert!(output.starts_with("# Rust 入门"));
        assert!(output.contains("## 提及实体"));
        assert!(output.contains("## 主要内容"));
        assert!(output.contains("## 知识点关系"));
        assert!(output.contains("**extraction_mode**: primary"));
        assert!(!output.contains("## 警告"));
    }

    #[test]
    fn test_warnings_always_render_when_present() {
        let graph = sample_graph();
        let warnings = vec!["partial extraction: native text was unavailable".to_string()];
        let ctx = RenderContext {
            platform: Platform::Xiaohongshu,
            canonical_id: "abc",
            extraction_mode: ExtractionMode::Partial,
            warnings: &warnings,
        };
        let output = MarkdownRenderer.render(&graph, &ctx);
        assert!(output.contains("## 警告"));
        assert!(output.contains("partial extraction"));
    }
}

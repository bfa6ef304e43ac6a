//! Knowledge graph builder - one graph per normalized content record.
//!
//! Node confidence starts from the extraction mode's base (primary 1.0,
//! context-assisted 0.6, partial 0.3) and is scaled by 0.8 for nodes
//! sourced purely from OCR text. Nodes dedup by (type, normalized
//! label) keeping the maximum confidence; edges merge per endpoint pair
//! and relation.

use tracing::debug;

use crate::types::content::{NormalizedContent, TextSource};
use crate::types::graph::{KnowledgeGraph, NodeType, Relation};

/// Confidence multiplier for nodes whose text exists only in OCR output.
const OCR_CONFIDENCE_FACTOR: f32 = 0.8;

/// Builds a `KnowledgeGraph` from one `NormalizedContent`.
pub struct GraphBuilder {
    /// Minimum token count for a body segment to become a claim. A CJK
    /// character counts as one token, a latin word as one token.
    min_claim_tokens: usize,
}

impl GraphBuilder {
    pub fn new(min_claim_tokens: usize) -> Self {
        Self { min_claim_tokens }
    }

    pub fn build(&self, content: &NormalizedContent) -> KnowledgeGraph {
        let base = content.extraction_mode.base_confidence();
        let mut graph = KnowledgeGraph::new();

        // 1. The source node anchors the graph to the original URL.
        let source_label = format!("{}:{}", content.source_platform, content.canonical_id);
        let source_id = graph.upsert_node(NodeType::Source, source_label, base);

        // 2. One topic node from the title.
        let topic_confidence = if content.title_from_image {
            base * OCR_CONFIDENCE_FACTOR
        } else {
            base
        };
        let topic_id = graph.upsert_node(NodeType::Topic, content.title.clone(), topic_confidence);

        // The topic is always derived from the source, which keeps every
        // graph connected even before any claims exist.
        let edge_confidence = topic_confidence.min(base);
        graph
            .add_edge(&topic_id, &source_id, Relation::DerivedFrom, edge_confidence)
            .expect("topic and source were just inserted");

        // 3. One entity node per distinct mentioned entity.
        for (name, provenance) in &content.mentioned_entities {
            let confidence = if *provenance == TextSource::Image {
                base * OCR_CONFIDENCE_FACTOR
            } else {
                base
            };
            let entity_id = graph.upsert_node(NodeType::Entity, name.clone(), confidence);
            graph
                .add_edge(
                    &topic_id,
                    &entity_id,
                    Relation::Mentions,
                    confidence.min(topic_confidence),
                )
                .expect("entity and topic exist");
        }

        // 4. One claim node per substantive body segment.
        for segment in &content.body_segments {
            if token_count(&segment.text) < self.min_claim_tokens {
                continue;
            }
            let confidence = if segment.source == TextSource::Image {
                base * OCR_CONFIDENCE_FACTOR
            } else {
                base
            };
            let claim_id = graph.upsert_node(NodeType::Claim, segment.text.clone(), confidence);
            graph
                .add_edge(
                    &claim_id,
                    &topic_id,
                    Relation::RelatesTo,
                    confidence.min(topic_confidence),
                )
                .expect("claim and topic exist");
            graph
                .add_edge(
                    &claim_id,
                    &source_id,
                    Relation::DerivedFrom,
                    confidence.min(base),
                )
                .expect("claim and source exist");
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            claims = graph.claim_count(),
            "knowledge graph built"
        );

        graph
    }
}

/// Count tokens in mixed CJK/latin text: one per CJK character, one per
/// latin word run.
pub fn token_count(text: &str) -> usize {
    let mut count = 0;
    let mut in_word = false;

    for ch in text.chars() {
        if is_cjk(ch) {
            count += 1;
            in_word = false;
        } else if ch.is_alphanumeric() {
            if !in_word {
                count += 1;
                in_word = true;
            }
        } else {
            in_word = false;
        }
    }

    count
}

fn is_cjk(ch: char) -> bool {
    matches!(ch as u32,
        0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0xF900..=0xFAFF)
}

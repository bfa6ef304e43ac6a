//! Knowledge graph types: typed nodes, typed relations, one graph per run.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashSet, VecDeque};

use crate::error::GraphError;

/// Node type in the knowledge graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Topic,
    Entity,
    Claim,
    Source,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Topic => "topic",
            NodeType::Entity => "entity",
            NodeType::Claim => "claim",
            NodeType::Source => "source",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed relation between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Mentions,
    Supports,
    RelatesTo,
    DerivedFrom,
}

impl Relation {
    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Mentions => "mentions",
            Relation::Supports => "supports",
            Relation::RelatesTo => "relates to",
            Relation::DerivedFrom => "derived from",
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A graph node. `id` is a stable hash of normalized label + type, so
/// identical content always produces identical node ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub node_type: NodeType,
    pub label: String,
    pub confidence: f32,
}

/// A directed, typed edge. Both endpoints must exist in the same graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from_id: String,
    pub to_id: String,
    pub relation: Relation,
    pub confidence: f32,
}

/// Compute the stable node id for a (type, label) pair.
///
/// Labels are normalized (trimmed, lowercased, whitespace collapsed)
/// before hashing so cosmetic variants dedup to one node.
pub fn node_id(node_type: NodeType, label: &str) -> String {
    let normalized = normalize_label(label);
    let mut hasher = Sha256::new();
    hasher.update(node_type.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(normalized.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..12])
}

/// Normalize a label for identity purposes: trim, lowercase, collapse
/// internal whitespace.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// The knowledge graph for one pipeline run.
///
/// Owns its nodes (keyed by id, insertion order preserved) and edges.
/// Exactly one `Source` node; all other nodes connected to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    nodes: IndexMap<String, GraphNode>,
    edges: Vec<GraphEdge>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, deduplicating by id.
    ///
    /// When a node with the same `(type, normalized label)` already
    /// exists, the confidences are merged by taking the maximum. Returns
    /// the node id either way.
    pub fn upsert_node(
        &mut self,
        node_type: NodeType,
        label: impl Into<String>,
        confidence: f32,
    ) -> String {
        let label = label.into();
        let id = node_id(node_type, &label);
        match self.nodes.get_mut(&id) {
            Some(existing) => {
                existing.confidence = existing.confidence.max(confidence);
            }
            None => {
                self.nodes.insert(
                    id.clone(),
                    GraphNode {
                        id: id.clone(),
                        node_type,
                        label,
                        confidence,
                    },
                );
            }
        }
        id
    }

    /// Add an edge between two existing nodes.
    ///
    /// Edges between the same endpoint pair with the same relation are
    /// merged (max confidence), not duplicated. Self-loops are only
    /// representable for `DerivedFrom`.
    pub fn add_edge(
        &mut self,
        from_id: &str,
        to_id: &str,
        relation: Relation,
        confidence: f32,
    ) -> Result<(), GraphError> {
        if !self.nodes.contains_key(from_id) {
            return Err(GraphError::MissingEndpoint { id: from_id.into() });
        }
        if !self.nodes.contains_key(to_id) {
            return Err(GraphError::MissingEndpoint { id: to_id.into() });
        }
        if from_id == to_id && relation != Relation::DerivedFrom {
            return Err(GraphError::InvalidSelfLoop {
                relation: relation.to_string(),
            });
        }

        if let Some(existing) = self
            .edges
            .iter_mut()
            .find(|e| e.from_id == from_id && e.to_id == to_id && e.relation == relation)
        {
            existing.confidence = existing.confidence.max(confidence);
            return Ok(());
        }

        self.edges.push(GraphEdge {
            from_id: from_id.into(),
            to_id: to_id.into(),
            relation,
            confidence,
        });
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes_of_type(&self, node_type: NodeType) -> impl Iterator<Item = &GraphNode> {
        self.nodes
            .values()
            .filter(move |n| n.node_type == node_type)
    }

    pub fn claim_count(&self) -> usize {
        self.nodes_of_type(NodeType::Claim).count()
    }

    /// The single source node, if the graph is well-formed.
    pub fn source_node(&self) -> Option<&GraphNode> {
        let mut sources = self.nodes_of_type(NodeType::Source);
        let first = sources.next();
        if sources.next().is_some() {
            return None;
        }
        first
    }

    /// Mean confidence over all nodes; 0.0 for an empty graph.
    pub fn mean_confidence(&self) -> f32 {
        if self.nodes.is_empty() {
            return 0.0;
        }
        let total: f32 = self.nodes.values().map(|n| n.confidence).sum();
        total / self.nodes.len() as f32
    }

    /// Validate structural invariants: exactly one Source node, and every
    /// node connected to it (edges treated as undirected for
    /// connectivity).
    pub fn validate(&self) -> bool {
        let Some(source) = self.source_node() else {
            return false;
        };

        let mut reachable: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        reachable.insert(source.id.as_str());
        queue.push_back(source.id.as_str());

        while let Some(current) = queue.pop_front() {
            for edge in &self.edges {
                let neighbor = if edge.from_id == current {
                    edge.to_id.as_str()
                } else if edge.to_id == current {
                    edge.from_id.as_str()
                } else {
                    continue;
                };
                if reachable.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }

        reachable.len() == self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_stable_under_label_cosmetics() {
        assert_eq!(
            node_id(NodeType::Entity, "Rust Programming"),
            node_id(NodeType::Entity, "  rust   programming  ")
        );
        assert_ne!(
            node_id(NodeType::Entity, "rust"),
            node_id(NodeType::Topic, "rust")
        );
    }

    #[test]
    fn test_upsert_node_dedupes_with_max_confidence() {
        let mut graph = KnowledgeGraph::new();
        let a = graph.upsert_node(NodeType::Entity, "Rust", 0.4);
        let b = graph.upsert_node(NodeType::Entity, "rust", 0.9);
        assert_eq!(a, b);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.node(&a).unwrap().confidence, 0.9);
    }

    #[test]
    fn test_add_edge_requires_endpoints() {
        let mut graph = KnowledgeGraph::new();
        let id = graph.upsert_node(NodeType::Topic, "topic", 1.0);
        assert!(graph.add_edge(&id, "missing", Relation::Mentions, 1.0).is_err());
    }

    #[test]
    fn test_edges_merge_not_duplicate() {
        let mut graph = KnowledgeGraph::new();
        let a = graph.upsert_node(NodeType::Topic, "a", 1.0);
        let b = graph.upsert_node(NodeType::Entity, "b", 1.0);
        graph.add_edge(&a, &b, Relation::Mentions, 0.5).unwrap();
        graph.add_edge(&a, &b, Relation::Mentions, 0.8).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edges()[0].confidence, 0.8);
    }

    #[test]
    fn test_self_loop_only_for_derived_from() {
        let mut graph = KnowledgeGraph::new();
        let id = graph.upsert_node(NodeType::Claim, "claim", 1.0);
        assert!(graph.add_edge(&id, &id, Relation::Supports, 1.0).is_err());
        assert!(graph
            .add_edge(&id, &id, Relation::DerivedFrom, 1.0)
            .is_ok());
    }

    #[test]
    fn test_validate_connectivity() {
        let mut graph = KnowledgeGraph::new();
        let source = graph.upsert_node(NodeType::Source, "bilibili:BV1", 1.0);
        let topic = graph.upsert_node(NodeType::Topic, "topic", 1.0);
        assert!(!graph.validate());

        graph
            .add_edge(&topic, &source, Relation::DerivedFrom, 1.0)
            .unwrap();
        assert!(graph.validate());
    }

    #[test]
    fn test_mean_confidence() {
        let mut graph = KnowledgeGraph::new();
        assert_eq!(graph.mean_confidence(), 0.0);
        graph.upsert_node(NodeType::Source, "s", 1.0);
        graph.upsert_node(NodeType::Claim, "c", 0.5);
        assert!((graph.mean_confidence() - 0.75).abs() < f32::EPSILON);
    }
}

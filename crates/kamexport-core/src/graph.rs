//! # KAM Graph Model
//!
//! The in-memory representation of a knowledge assembly model.
//!
//! A `Kam` owns its nodes and edges. Edges refer to nodes by `NodeId` only,
//! so one node may be shared by any number of edges. All collections are
//! `BTreeMap`s keyed by identifier, which gives every pass over the graph
//! the same deterministic order.

use crate::{EdgeId, FunctionType, KamError, NodeId, NodeView, RelationshipType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// KAM INFO
// =============================================================================

/// Catalog information about a KAM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KamInfo {
    /// The unique name the KAM is selected by.
    pub name: String,
    /// Free-form description.
    pub description: String,
}

impl KamInfo {
    /// Create catalog info with an empty description.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
        }
    }
}

// =============================================================================
// NODES & EDGES
// =============================================================================

/// A node of a KAM as stored, before any dialect substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KamNode {
    pub id: NodeId,
    pub function: FunctionType,
    pub label: String,
}

impl KamNode {
    /// Create a new node.
    #[must_use]
    pub fn new(id: NodeId, function: FunctionType, label: impl Into<String>) -> Self {
        Self {
            id,
            function,
            label: label.into(),
        }
    }

    /// The stored presentation of this node.
    #[must_use]
    pub fn view(&self) -> NodeView {
        NodeView::new(self.function, self.label.clone())
    }
}

/// A directed edge of a KAM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KamEdge {
    pub id: EdgeId,
    pub relationship: RelationshipType,
    pub source: NodeId,
    pub target: NodeId,
}

impl KamEdge {
    /// Create a new edge.
    #[must_use]
    pub const fn new(
        id: EdgeId,
        relationship: RelationshipType,
        source: NodeId,
        target: NodeId,
    ) -> Self {
        Self {
            id,
            relationship,
            source,
            target,
        }
    }
}

// =============================================================================
// KAM
// =============================================================================

/// A knowledge assembly model: a typed, directed graph.
///
/// Read-only for the duration of an export. Edges can only be inserted once
/// both endpoints are present, so a `Kam` built through this API never holds
/// a dangling edge.
#[derive(Debug, Clone)]
pub struct Kam {
    info: KamInfo,
    nodes: BTreeMap<NodeId, KamNode>,
    edges: BTreeMap<EdgeId, KamEdge>,
}

impl Kam {
    /// Create an empty KAM.
    #[must_use]
    pub fn new(info: KamInfo) -> Self {
        Self {
            info,
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
        }
    }

    /// Catalog information for this KAM.
    #[must_use]
    pub fn info(&self) -> &KamInfo {
        &self.info
    }

    /// The KAM's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Insert a node, replacing any node with the same id.
    pub fn insert_node(&mut self, node: KamNode) {
        self.nodes.insert(node.id, node);
    }

    /// Insert an edge.
    ///
    /// Returns `KamError::DanglingEdge` if either endpoint is not a node of
    /// this KAM.
    pub fn insert_edge(&mut self, edge: KamEdge) -> Result<(), KamError> {
        for endpoint in [edge.source, edge.target] {
            if !self.nodes.contains_key(&endpoint) {
                return Err(KamError::DanglingEdge {
                    edge: edge.id,
                    node: endpoint,
                });
            }
        }
        self.edges.insert(edge.id, edge);
        Ok(())
    }

    /// Get a node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&KamNode> {
        self.nodes.get(&id)
    }

    /// Get an edge by id.
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&KamEdge> {
        self.edges.get(&id)
    }

    /// Check if the KAM contains a node.
    #[must_use]
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &KamNode> {
        self.nodes.values()
    }

    /// All edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = &KamEdge> {
        self.edges.values()
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_kam() -> Kam {
        let mut kam = Kam::new(KamInfo::new("demo"));
        kam.insert_node(KamNode::new(
            NodeId(1),
            FunctionType::KinaseActivity,
            "geneA",
        ));
        kam.insert_node(KamNode::new(
            NodeId(2),
            FunctionType::ProteinAbundance,
            "geneB",
        ));
        kam
    }

    #[test]
    fn insert_edge_between_known_nodes() {
        let mut kam = two_node_kam();
        kam.insert_edge(KamEdge::new(
            EdgeId(10),
            RelationshipType::Increases,
            NodeId(1),
            NodeId(2),
        ))
        .expect("insert edge");

        assert_eq!(kam.edge_count(), 1);
        assert_eq!(kam.edge(EdgeId(10)).expect("edge").target, NodeId(2));
    }

    #[test]
    fn insert_edge_rejects_dangling_target() {
        let mut kam = two_node_kam();
        let result = kam.insert_edge(KamEdge::new(
            EdgeId(11),
            RelationshipType::Increases,
            NodeId(1),
            NodeId(99),
        ));

        assert!(matches!(
            result,
            Err(KamError::DanglingEdge {
                edge: EdgeId(11),
                node: NodeId(99)
            })
        ));
        assert_eq!(kam.edge_count(), 0);
    }

    #[test]
    fn nodes_iterate_in_id_order() {
        let mut kam = Kam::new(KamInfo::new("ordered"));
        for id in [5, 1, 3] {
            kam.insert_node(KamNode::new(NodeId(id), FunctionType::Abundance, "x"));
        }
        let ids: Vec<_> = kam.nodes().map(|n| n.id).collect();
        assert_eq!(ids, vec![NodeId(1), NodeId(3), NodeId(5)]);
    }
}

//! # KAM Document
//!
//! The interchange form of one stored KAM: graph, supporting terms, ortholog
//! table and dialect table. Loaded from JSON by the CLI and embedded in PKAM
//! snapshots.
//!
//! ```json
//! {
//!   "name": "demo",
//!   "nodes": [{ "id": 1, "function": "kinaseActivity", "label": "geneA",
//!               "terms": ["kin(p(MGI:GeneA))"] }],
//!   "edges": [{ "id": 10, "relationship": "increases", "source": 1, "target": 2 }],
//!   "orthologs": [{ "node": 1, "taxonomy": 9606,
//!                   "function": "kinaseActivity", "label": "GENEA_human" }]
//! }
//! ```

use crate::dialect::DialectTable;
use crate::graph::{Kam, KamEdge, KamInfo, KamNode};
use crate::{
    BelTerm, EdgeId, FunctionType, KamError, NodeId, NodeView, RelationshipType, TaxonomyId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A node with its supporting terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentNode {
    pub id: NodeId,
    pub function: FunctionType,
    pub label: String,
    #[serde(default)]
    pub terms: Vec<BelTerm>,
}

impl DocumentNode {
    /// Create a node without supporting terms.
    #[must_use]
    pub fn new(id: NodeId, function: FunctionType, label: impl Into<String>) -> Self {
        Self {
            id,
            function,
            label: label.into(),
            terms: Vec::new(),
        }
    }
}

/// One row of the ortholog table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrthologEntry {
    pub node: NodeId,
    pub taxonomy: TaxonomyId,
    pub function: FunctionType,
    pub label: String,
}

/// A dialect override for a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayEntry {
    pub node: NodeId,
    pub function: FunctionType,
    pub label: String,
}

/// A dialect override for an edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeOverride {
    pub edge: EdgeId,
    pub relationship: RelationshipType,
}

/// Everything stored for one KAM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KamDocument {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub nodes: Vec<DocumentNode>,
    #[serde(default)]
    pub edges: Vec<KamEdge>,
    #[serde(default)]
    pub orthologs: Vec<OrthologEntry>,
    #[serde(default)]
    pub display: Vec<DisplayEntry>,
    #[serde(default)]
    pub edge_overrides: Vec<EdgeOverride>,
}

impl KamDocument {
    /// Create an empty document.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            orthologs: Vec::new(),
            display: Vec::new(),
            edge_overrides: Vec::new(),
        }
    }

    /// Assemble a document from a loaded KAM and its tables.
    #[must_use]
    pub fn from_parts(
        kam: &Kam,
        terms: &BTreeMap<NodeId, Vec<BelTerm>>,
        orthologs: &BTreeMap<(NodeId, TaxonomyId), NodeView>,
        dialect: &DialectTable,
    ) -> Self {
        let nodes = kam
            .nodes()
            .map(|node| DocumentNode {
                id: node.id,
                function: node.function,
                label: node.label.clone(),
                terms: terms.get(&node.id).cloned().unwrap_or_default(),
            })
            .collect();
        let edges = kam.edges().cloned().collect();
        Self::from_rows(kam.info().clone(), nodes, edges, orthologs, dialect)
    }

    /// Assemble a document from rows already in id order.
    #[must_use]
    pub fn from_rows(
        info: KamInfo,
        nodes: Vec<DocumentNode>,
        edges: Vec<KamEdge>,
        orthologs: &BTreeMap<(NodeId, TaxonomyId), NodeView>,
        dialect: &DialectTable,
    ) -> Self {
        Self {
            name: info.name,
            description: info.description,
            nodes,
            edges,
            orthologs: orthologs
                .iter()
                .map(|((node, taxonomy), view)| OrthologEntry {
                    node: *node,
                    taxonomy: *taxonomy,
                    function: view.function,
                    label: view.label.clone(),
                })
                .collect(),
            display: dialect
                .node_overrides()
                .map(|(node, view)| DisplayEntry {
                    node,
                    function: view.function,
                    label: view.label.clone(),
                })
                .collect(),
            edge_overrides: dialect
                .edge_overrides()
                .map(|(edge, relationship)| EdgeOverride { edge, relationship })
                .collect(),
        }
    }

    /// Catalog info for this document.
    #[must_use]
    pub fn info(&self) -> KamInfo {
        KamInfo {
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }

    /// Build the graph, checking identifier uniqueness and edge endpoints.
    pub fn to_kam(&self) -> Result<Kam, KamError> {
        if self.name.trim().is_empty() {
            return Err(KamError::SerializationError(
                "KAM document has no name".to_string(),
            ));
        }

        let mut kam = Kam::new(self.info());
        for node in &self.nodes {
            if kam.contains_node(node.id) {
                return Err(KamError::SerializationError(format!(
                    "Duplicate node id {} in KAM '{}'",
                    node.id, self.name
                )));
            }
            kam.insert_node(KamNode::new(node.id, node.function, node.label.clone()));
        }

        let mut seen_edges = BTreeSet::new();
        for edge in &self.edges {
            if !seen_edges.insert(edge.id) {
                return Err(KamError::SerializationError(format!(
                    "Duplicate edge id {} in KAM '{}'",
                    edge.id, self.name
                )));
            }
            kam.insert_edge(edge.clone())?;
        }
        Ok(kam)
    }

    /// Supporting terms by node, omitting nodes without terms.
    #[must_use]
    pub fn terms(&self) -> BTreeMap<NodeId, Vec<BelTerm>> {
        self.nodes
            .iter()
            .filter(|node| !node.terms.is_empty())
            .map(|node| (node.id, node.terms.clone()))
            .collect()
    }

    /// The ortholog table keyed by (node, taxonomy).
    #[must_use]
    pub fn ortholog_table(&self) -> BTreeMap<(NodeId, TaxonomyId), NodeView> {
        self.orthologs
            .iter()
            .map(|o| ((o.node, o.taxonomy), NodeView::new(o.function, o.label.clone())))
            .collect()
    }

    /// The generic dialect table.
    #[must_use]
    pub fn dialect_table(&self) -> DialectTable {
        let mut table = DialectTable::new();
        for entry in &self.display {
            table.insert_node(entry.node, NodeView::new(entry.function, entry.label.clone()));
        }
        for entry in &self.edge_overrides {
            table.insert_edge(entry.edge, entry.relationship);
        }
        table
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> KamDocument {
        let mut doc = KamDocument::new("sample");
        let mut a = DocumentNode::new(NodeId(1), FunctionType::GeneAbundance, "A");
        a.terms = vec![BelTerm::new("g(HGNC:A)"), BelTerm::new("g(EGID:1)")];
        doc.nodes.push(a);
        doc.nodes
            .push(DocumentNode::new(NodeId(2), FunctionType::RnaAbundance, "B"));
        doc.edges.push(KamEdge::new(
            EdgeId(7),
            RelationshipType::TranscribedTo,
            NodeId(1),
            NodeId(2),
        ));
        doc
    }

    #[test]
    fn to_kam_builds_graph() {
        let kam = sample().to_kam().expect("to kam");
        assert_eq!(kam.name(), "sample");
        assert_eq!(kam.node_count(), 2);
        assert_eq!(kam.edge_count(), 1);
    }

    #[test]
    fn to_kam_rejects_dangling_edge() {
        let mut doc = sample();
        doc.edges.push(KamEdge::new(
            EdgeId(8),
            RelationshipType::Increases,
            NodeId(2),
            NodeId(42),
        ));
        assert!(matches!(
            doc.to_kam(),
            Err(KamError::DanglingEdge {
                edge: EdgeId(8),
                node: NodeId(42)
            })
        ));
    }

    #[test]
    fn to_kam_rejects_duplicate_node() {
        let mut doc = sample();
        doc.nodes
            .push(DocumentNode::new(NodeId(1), FunctionType::Abundance, "dup"));
        assert!(matches!(doc.to_kam(), Err(KamError::SerializationError(_))));
    }

    #[test]
    fn terms_keep_provenance_order() {
        let terms = sample().terms();
        let a = terms.get(&NodeId(1)).expect("terms for A");
        assert_eq!(a[0].as_str(), "g(HGNC:A)");
        assert_eq!(a[1].as_str(), "g(EGID:1)");
        assert!(!terms.contains_key(&NodeId(2)));
    }

    #[test]
    fn from_parts_reassembles_document() {
        let original = sample();
        let kam = original.to_kam().expect("to kam");
        let rebuilt = KamDocument::from_parts(
            &kam,
            &original.terms(),
            &original.ortholog_table(),
            &original.dialect_table(),
        );
        assert_eq!(rebuilt, original);
    }
}

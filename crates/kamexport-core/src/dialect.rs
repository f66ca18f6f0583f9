//! # Dialect Chain
//!
//! Layered substitution of node and edge presentation.
//!
//! A chain is built from an identity layer over the stored `Kam`, wrapped by
//! any number of override layers:
//!
//! ```text
//! Species(taxonomy) ─wraps─▶ Dialect(table) ─wraps─▶ Identity(kam)
//! ```
//!
//! Resolution is innermost-first for structure and outermost-wins for
//! presentation: the identity layer decides whether a node or edge exists
//! at all, then each override layer, from the inside out, may replace the
//! label/function (nodes) or relationship (edges). Identifiers and edge
//! endpoints are never rewritten by any layer.

use crate::graph::{Kam, KamEdge};
use crate::storage::KamStore;
use crate::{EdgeId, FunctionType, KamError, NodeId, NodeView, RelationshipType, TaxonomyId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// DIALECT TABLE
// =============================================================================

/// A substitution table scoped to one KAM (e.g. portal display names).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialectTable {
    nodes: BTreeMap<NodeId, NodeView>,
    edges: BTreeMap<EdgeId, RelationshipType>,
}

impl DialectTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the presentation of a node.
    pub fn insert_node(&mut self, id: NodeId, view: NodeView) {
        self.nodes.insert(id, view);
    }

    /// Override the relationship of an edge.
    pub fn insert_edge(&mut self, id: EdgeId, relationship: RelationshipType) {
        self.edges.insert(id, relationship);
    }

    /// The node override, if any.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&NodeView> {
        self.nodes.get(&id)
    }

    /// The edge override, if any.
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<RelationshipType> {
        self.edges.get(&id).copied()
    }

    /// Node overrides in id order.
    pub fn node_overrides(&self) -> impl Iterator<Item = (NodeId, &NodeView)> {
        self.nodes.iter().map(|(id, view)| (*id, view))
    }

    /// Edge overrides in id order.
    pub fn edge_overrides(&self) -> impl Iterator<Item = (EdgeId, RelationshipType)> + '_ {
        self.edges.iter().map(|(id, rel)| (*id, *rel))
    }

    /// Whether the table overrides nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

// =============================================================================
// RESOLVED VALUES
// =============================================================================

/// A node as seen through a dialect chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNode {
    /// Always the stored identifier.
    pub id: NodeId,
    pub function: FunctionType,
    pub label: String,
}

impl ResolvedNode {
    fn with_view(id: NodeId, view: NodeView) -> Self {
        Self {
            id,
            function: view.function,
            label: view.label,
        }
    }
}

/// An edge as seen through a dialect chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEdge {
    /// Always the stored identifier.
    pub id: EdgeId,
    pub relationship: RelationshipType,
    /// Always the stored source.
    pub source: NodeId,
    /// Always the stored target.
    pub target: NodeId,
}

impl From<&KamEdge> for ResolvedEdge {
    fn from(edge: &KamEdge) -> Self {
        Self {
            id: edge.id,
            relationship: edge.relationship,
            source: edge.source,
            target: edge.target,
        }
    }
}

// =============================================================================
// LAYERS
// =============================================================================

/// Where an override layer finds its substitutions.
#[derive(Debug)]
pub enum Substitution<'a, S> {
    /// Generic dialect: a table loaded once for the current KAM.
    Table(DialectTable),
    /// Species dialect: ortholog lookups against the store.
    Species {
        store: &'a S,
        taxonomy: TaxonomyId,
    },
}

/// One layer of a dialect chain.
#[derive(Debug)]
pub enum DialectLayer<'a, S> {
    /// The stored KAM, returned as-is.
    Identity(&'a Kam),
    /// Substitutes presentation where it can, otherwise falls through to `inner`.
    Override {
        substitution: Substitution<'a, S>,
        inner: Box<DialectLayer<'a, S>>,
    },
}

impl<'a, S: KamStore> DialectLayer<'a, S> {
    /// The KAM at the bottom of this layer.
    #[must_use]
    pub fn kam(&self) -> &'a Kam {
        match self {
            Self::Identity(kam) => kam,
            Self::Override { inner, .. } => inner.kam(),
        }
    }

    /// Resolve a node through this layer and everything it wraps.
    pub fn resolve_node(&self, id: NodeId) -> Result<ResolvedNode, KamError> {
        match self {
            Self::Identity(kam) => kam
                .node(id)
                .map(|node| ResolvedNode::with_view(id, node.view()))
                .ok_or(KamError::NodeNotFound(id)),
            Self::Override {
                substitution,
                inner,
            } => {
                let resolved = inner.resolve_node(id)?;
                let view = match substitution {
                    Substitution::Table(table) => table.node(id).cloned(),
                    Substitution::Species { store, taxonomy } => {
                        store.ortholog(self.kam().info(), id, *taxonomy)?
                    }
                };
                Ok(view.map_or(resolved, |view| ResolvedNode::with_view(id, view)))
            }
        }
    }

    /// Resolve an edge through this layer and everything it wraps.
    pub fn resolve_edge(&self, id: EdgeId) -> Result<ResolvedEdge, KamError> {
        match self {
            Self::Identity(kam) => kam
                .edge(id)
                .map(ResolvedEdge::from)
                .ok_or(KamError::EdgeNotFound(id)),
            Self::Override {
                substitution,
                inner,
            } => {
                let mut resolved = inner.resolve_edge(id)?;
                if let Substitution::Table(table) = substitution {
                    if let Some(relationship) = table.edge(id) {
                        resolved.relationship = relationship;
                    }
                }
                Ok(resolved)
            }
        }
    }
}

// =============================================================================
// CHAIN BUILDER
// =============================================================================

/// A composed dialect chain, outermost layer first.
#[derive(Debug)]
pub struct DialectChain<'a, S> {
    outer: DialectLayer<'a, S>,
}

impl<'a, S: KamStore> DialectChain<'a, S> {
    /// A chain with only the identity layer.
    #[must_use]
    pub fn identity(kam: &'a Kam) -> Self {
        Self {
            outer: DialectLayer::Identity(kam),
        }
    }

    /// Wrap the chain in a generic dialect layer over `table`.
    #[must_use]
    pub fn with_dialect(self, table: DialectTable) -> Self {
        self.wrap(Substitution::Table(table))
    }

    /// Wrap the chain in a species dialect layer for `taxonomy`.
    #[must_use]
    pub fn with_species(self, store: &'a S, taxonomy: TaxonomyId) -> Self {
        self.wrap(Substitution::Species { store, taxonomy })
    }

    /// The standard export chain: `Species(Dialect(Identity))`.
    ///
    /// The dialect table is fetched from the store once, here.
    pub fn orthologized(
        kam: &'a Kam,
        store: &'a S,
        taxonomy: TaxonomyId,
    ) -> Result<Self, KamError> {
        let table = store.dialect_table(kam.info())?;
        Ok(Self::identity(kam)
            .with_dialect(table)
            .with_species(store, taxonomy))
    }

    fn wrap(self, substitution: Substitution<'a, S>) -> Self {
        Self {
            outer: DialectLayer::Override {
                substitution,
                inner: Box::new(self.outer),
            },
        }
    }

    /// The KAM at the bottom of the chain.
    #[must_use]
    pub fn kam(&self) -> &'a Kam {
        self.outer.kam()
    }

    /// Number of layers, identity included.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut layer = &self.outer;
        while let DialectLayer::Override { inner, .. } = layer {
            depth += 1;
            layer = inner;
        }
        depth
    }

    /// Resolve a node through the whole chain.
    pub fn resolve_node(&self, id: NodeId) -> Result<ResolvedNode, KamError> {
        self.outer.resolve_node(id)
    }

    /// Resolve an edge through the whole chain.
    pub fn resolve_edge(&self, id: EdgeId) -> Result<ResolvedEdge, KamError> {
        self.outer.resolve_edge(id)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::document::{DocumentNode, KamDocument, OrthologEntry};
    use crate::storage::MemoryKamStore;

    const HUMAN: TaxonomyId = TaxonomyId(9606);

    fn demo_store() -> MemoryKamStore {
        let mut doc = KamDocument::new("demo");
        doc.nodes.push(DocumentNode::new(
            NodeId(1),
            FunctionType::KinaseActivity,
            "geneA",
        ));
        doc.nodes.push(DocumentNode::new(
            NodeId(2),
            FunctionType::ProteinAbundance,
            "geneB",
        ));
        doc.edges.push(KamEdge::new(
            EdgeId(10),
            RelationshipType::Increases,
            NodeId(1),
            NodeId(2),
        ));
        doc.orthologs.push(OrthologEntry {
            node: NodeId(1),
            taxonomy: HUMAN,
            function: FunctionType::KinaseActivity,
            label: "GENEA_human".to_string(),
        });

        let mut store = MemoryKamStore::new();
        store.insert(doc).expect("insert document");
        store
    }

    #[test]
    fn identity_returns_stored_presentation() {
        let store = demo_store();
        let kam = store.get_kam("demo").expect("get").expect("present");
        let chain: DialectChain<'_, MemoryKamStore> = DialectChain::identity(&kam);

        let node = chain.resolve_node(NodeId(2)).expect("resolve");
        assert_eq!(node.label, "geneB");
        assert_eq!(node.function, FunctionType::ProteinAbundance);
        assert_eq!(chain.depth(), 1);
    }

    #[test]
    fn species_layer_substitutes_ortholog() {
        let store = demo_store();
        let kam = store.get_kam("demo").expect("get").expect("present");
        let chain = DialectChain::identity(&kam).with_species(&store, HUMAN);

        let node = chain.resolve_node(NodeId(1)).expect("resolve");
        assert_eq!(node.id, NodeId(1));
        assert_eq!(node.label, "GENEA_human");
    }

    #[test]
    fn species_layer_falls_back_without_ortholog() {
        let store = demo_store();
        let kam = store.get_kam("demo").expect("get").expect("present");
        let chain = DialectChain::identity(&kam).with_species(&store, HUMAN);

        let node = chain.resolve_node(NodeId(2)).expect("resolve");
        assert_eq!(node.label, "geneB");
        assert_eq!(node.function, FunctionType::ProteinAbundance);
    }

    #[test]
    fn outer_layer_wins_over_inner_override() {
        let store = demo_store();
        let kam = store.get_kam("demo").expect("get").expect("present");
        let mut table = DialectTable::new();
        table.insert_node(
            NodeId(1),
            NodeView::new(FunctionType::KinaseActivity, "GeneA (portal)"),
        );
        table.insert_node(
            NodeId(2),
            NodeView::new(FunctionType::ProteinAbundance, "GeneB (portal)"),
        );

        let chain = DialectChain::identity(&kam)
            .with_dialect(table)
            .with_species(&store, HUMAN);

        assert_eq!(chain.depth(), 3);
        // Species ortholog beats the portal name.
        assert_eq!(
            chain.resolve_node(NodeId(1)).expect("resolve").label,
            "GENEA_human"
        );
        // No ortholog: the portal name shows through.
        assert_eq!(
            chain.resolve_node(NodeId(2)).expect("resolve").label,
            "GeneB (portal)"
        );
    }

    #[test]
    fn override_never_invents_nodes() {
        let store = demo_store();
        let kam = store.get_kam("demo").expect("get").expect("present");
        let mut table = DialectTable::new();
        table.insert_node(NodeId(77), NodeView::new(FunctionType::Abundance, "ghost"));
        let chain: DialectChain<'_, MemoryKamStore> =
            DialectChain::identity(&kam).with_dialect(table);

        assert!(matches!(
            chain.resolve_node(NodeId(77)),
            Err(KamError::NodeNotFound(NodeId(77)))
        ));
    }

    #[test]
    fn edge_override_keeps_endpoints() {
        let store = demo_store();
        let kam = store.get_kam("demo").expect("get").expect("present");
        let mut table = DialectTable::new();
        table.insert_edge(EdgeId(10), RelationshipType::DirectlyIncreases);
        let chain = DialectChain::identity(&kam)
            .with_dialect(table)
            .with_species(&store, HUMAN);

        let edge = chain.resolve_edge(EdgeId(10)).expect("resolve");
        assert_eq!(edge.relationship, RelationshipType::DirectlyIncreases);
        assert_eq!(edge.source, NodeId(1));
        assert_eq!(edge.target, NodeId(2));
    }

    #[test]
    fn orthologized_chain_uses_store_dialect_table() {
        let store = demo_store();
        let kam = store.get_kam("demo").expect("get").expect("present");
        let chain = DialectChain::orthologized(&kam, &store, TaxonomyId(10090)).expect("chain");

        assert_eq!(chain.depth(), 3);
        assert_eq!(
            chain.resolve_node(NodeId(1)).expect("resolve").label,
            "geneA"
        );
    }
}

//! In-memory KAM store.

use super::{KamStore, TermSupport};
use crate::dialect::DialectTable;
use crate::formats::document::KamDocument;
use crate::graph::{Kam, KamInfo};
use crate::{BelTerm, KamError, NodeId, NodeView, TaxonomyId};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct StoredKam {
    kam: Kam,
    terms: BTreeMap<NodeId, Vec<BelTerm>>,
    orthologs: BTreeMap<(NodeId, TaxonomyId), NodeView>,
    dialect: DialectTable,
}

/// A volatile KAM store backed by `BTreeMap`s.
#[derive(Debug, Clone, Default)]
pub struct MemoryKamStore {
    kams: BTreeMap<String, StoredKam>,
}

impl MemoryKamStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a KAM from its document.
    ///
    /// The document is validated first; an invalid document leaves the
    /// store untouched.
    pub fn insert(&mut self, document: KamDocument) -> Result<(), KamError> {
        let kam = document.to_kam()?;
        let stored = StoredKam {
            terms: document.terms(),
            orthologs: document.ortholog_table(),
            dialect: document.dialect_table(),
            kam,
        };
        self.kams.insert(document.name, stored);
        Ok(())
    }

    fn stored(&self, name: &str) -> Result<&StoredKam, KamError> {
        self.kams
            .get(name)
            .ok_or_else(|| KamError::KamNotFound(name.to_string()))
    }
}

impl TermSupport for MemoryKamStore {
    fn supporting_terms(&self, kam: &KamInfo, node: NodeId) -> Result<Vec<BelTerm>, KamError> {
        Ok(self
            .stored(&kam.name)?
            .terms
            .get(&node)
            .cloned()
            .unwrap_or_default())
    }
}

impl KamStore for MemoryKamStore {
    fn get_kam(&self, name: &str) -> Result<Option<Kam>, KamError> {
        Ok(self.kams.get(name).map(|stored| stored.kam.clone()))
    }

    fn kam_names(&self) -> Result<Vec<String>, KamError> {
        Ok(self.kams.keys().cloned().collect())
    }

    fn ortholog(
        &self,
        kam: &KamInfo,
        node: NodeId,
        taxonomy: TaxonomyId,
    ) -> Result<Option<NodeView>, KamError> {
        Ok(self
            .stored(&kam.name)?
            .orthologs
            .get(&(node, taxonomy))
            .cloned())
    }

    fn dialect_table(&self, kam: &KamInfo) -> Result<DialectTable, KamError> {
        Ok(self.stored(&kam.name)?.dialect.clone())
    }

    fn export_document(&self, name: &str) -> Result<Option<KamDocument>, KamError> {
        Ok(self.kams.get(name).map(|stored| {
            KamDocument::from_parts(
                &stored.kam,
                &stored.terms,
                &stored.orthologs,
                &stored.dialect,
            )
        }))
    }
}

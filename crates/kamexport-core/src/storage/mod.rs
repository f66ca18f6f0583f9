//! # KAM Storage
//!
//! The store interface consumed by the export pipeline, and its backends:
//! - `MemoryKamStore`: `BTreeMap`-backed, volatile
//! - `RedbKamStore`: disk-backed, ACID, using redb
//!
//! The pipeline only ever reads from a store. Writing (`insert` /
//! `put_document`) is backend-specific and used by tooling and tests.

mod memory;
mod redb_store;

pub use memory::MemoryKamStore;
pub use redb_store::RedbKamStore;

use crate::dialect::DialectTable;
use crate::formats::document::KamDocument;
use crate::graph::{Kam, KamInfo};
use crate::{BelTerm, KamError, NodeId, NodeView, TaxonomyId};

/// Resolves the supporting terms behind a node.
///
/// Terms are returned in provenance order, which exports preserve verbatim.
/// A node without supporting terms yields an empty vector, never an error.
pub trait TermSupport {
    fn supporting_terms(&self, kam: &KamInfo, node: NodeId) -> Result<Vec<BelTerm>, KamError>;
}

/// Read access to stored KAMs and their orthology / dialect tables.
pub trait KamStore: TermSupport {
    /// Load a KAM by name. `Ok(None)` if no such KAM exists.
    fn get_kam(&self, name: &str) -> Result<Option<Kam>, KamError>;

    /// Names of all stored KAMs, sorted.
    fn kam_names(&self) -> Result<Vec<String>, KamError>;

    /// The ortholog of `node` in the species `taxonomy`, if one is known.
    fn ortholog(
        &self,
        kam: &KamInfo,
        node: NodeId,
        taxonomy: TaxonomyId,
    ) -> Result<Option<NodeView>, KamError>;

    /// The generic dialect table for a KAM. Empty when none is stored.
    fn dialect_table(&self, kam: &KamInfo) -> Result<DialectTable, KamError>;

    /// Everything stored for a KAM, as one document.
    fn export_document(&self, name: &str) -> Result<Option<KamDocument>, KamError>;
}

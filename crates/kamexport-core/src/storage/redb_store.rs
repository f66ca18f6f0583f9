//! # redb-backed KAM Store
//!
//! A disk-backed KAM store using the redb embedded database, providing:
//! - ACID transactions (a document is written in one write transaction)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Every KAM gets a numeric key in the catalog; all per-KAM rows are keyed
//! by `(kam_key, id)` so one KAM's rows form a contiguous range.

use super::{KamStore, TermSupport};
use crate::dialect::DialectTable;
use crate::formats::document::{DocumentNode, KamDocument};
use crate::graph::{Kam, KamEdge, KamInfo, KamNode};
use crate::{BelTerm, EdgeId, KamError, NodeId, NodeView, RelationshipType, TaxonomyId};
use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, Table, TableDefinition,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;

/// Catalog: KAM name -> kam key
const CATALOG: TableDefinition<&str, u64> = TableDefinition::new("catalog");

/// KAM info: kam key -> serialized KamInfo
const KAM_INFO: TableDefinition<u64, &[u8]> = TableDefinition::new("kam_info");

/// Nodes: (kam key, node id) -> serialized KamNode
const NODES: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("nodes");

/// Edges: (kam key, edge id) -> serialized KamEdge
const EDGES: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("edges");

/// Supporting terms: (kam key, node id) -> serialized Vec<BelTerm>
const TERMS: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("terms");

/// Orthologs: (kam key, node id, taxonomy id) -> serialized NodeView
const ORTHOLOGS: TableDefinition<(u64, u64, u32), &[u8]> = TableDefinition::new("orthologs");

/// Dialect node overrides: (kam key, node id) -> serialized NodeView
const DIALECT_NODES: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("dialect_nodes");

/// Dialect edge overrides: (kam key, edge id) -> serialized RelationshipType
const DIALECT_EDGES: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("dialect_edges");

/// Metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const PAIR_TABLES: [TableDefinition<'static, (u64, u64), &'static [u8]>; 5] =
    [NODES, EDGES, TERMS, DIALECT_NODES, DIALECT_EDGES];

fn storage_err(e: impl std::fmt::Display) -> KamError {
    KamError::IoError(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, KamError> {
    postcard::to_allocvec(value).map_err(|e| KamError::SerializationError(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, KamError> {
    postcard::from_bytes(bytes).map_err(|e| KamError::SerializationError(e.to_string()))
}

/// Read every `(kam_key, id)` row of a table, in id order.
fn read_pairs<T: DeserializeOwned>(
    txn: &ReadTransaction,
    definition: TableDefinition<'_, (u64, u64), &'static [u8]>,
    kam_key: u64,
) -> Result<Vec<(u64, T)>, KamError> {
    let table = txn.open_table(definition).map_err(storage_err)?;
    let mut rows = Vec::new();
    for entry in table
        .range((kam_key, 0u64)..=(kam_key, u64::MAX))
        .map_err(storage_err)?
    {
        let (key, value) = entry.map_err(storage_err)?;
        rows.push((key.value().1, decode(value.value())?));
    }
    Ok(rows)
}

/// Delete every `(kam_key, id)` row of a table.
fn clear_pairs(
    table: &mut Table<'_, (u64, u64), &'static [u8]>,
    kam_key: u64,
) -> Result<(), KamError> {
    let keys = table
        .range((kam_key, 0u64)..=(kam_key, u64::MAX))
        .map_err(storage_err)?
        .map(|entry| entry.map(|(key, _)| key.value()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(storage_err)?;
    for key in keys {
        table.remove(key).map_err(storage_err)?;
    }
    Ok(())
}

/// A disk-backed KAM store using redb.
///
/// Keeps the catalog (name -> kam key) in memory for fast lookups.
pub struct RedbKamStore {
    /// The redb database handle.
    db: Database,
    /// In-memory copy of the catalog table.
    catalog: BTreeMap<String, u64>,
    /// Next available kam key.
    next_kam_key: u64,
}

impl std::fmt::Debug for RedbKamStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbKamStore")
            .field("kam_count", &self.catalog.len())
            .field("next_kam_key", &self.next_kam_key)
            .finish_non_exhaustive()
    }
}

impl RedbKamStore {
    /// Open or create a store at the given path.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, KamError> {
        let db = Database::create(path.as_ref()).map_err(storage_err)?;
        Self::init(db)
    }

    /// Open an existing store. Fails if nothing exists at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, KamError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(KamError::IoError(format!(
                "KAM store not found at '{}'",
                path.display()
            )));
        }
        let db = Database::open(path).map_err(storage_err)?;
        Self::init(db)
    }

    fn init(db: Database) -> Result<Self, KamError> {
        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(storage_err)?;
            write_txn.open_table(CATALOG).map_err(storage_err)?;
            write_txn.open_table(KAM_INFO).map_err(storage_err)?;
            write_txn.open_table(ORTHOLOGS).map_err(storage_err)?;
            write_txn.open_table(METADATA).map_err(storage_err)?;
            for definition in PAIR_TABLES {
                write_txn.open_table(definition).map_err(storage_err)?;
            }
            write_txn.commit().map_err(storage_err)?;
        }

        let read_txn = db.begin_read().map_err(storage_err)?;

        let next_kam_key = {
            let table = read_txn.open_table(METADATA).map_err(storage_err)?;
            table
                .get("next_kam_key")
                .map_err(storage_err)?
                .map(|v| v.value())
                .unwrap_or(0)
        };

        let catalog = {
            let table = read_txn.open_table(CATALOG).map_err(storage_err)?;
            let mut catalog = BTreeMap::new();
            for entry in table.iter().map_err(storage_err)? {
                let (name, key) = entry.map_err(storage_err)?;
                catalog.insert(name.value().to_string(), key.value());
            }
            catalog
        };

        Ok(Self {
            db,
            catalog,
            next_kam_key,
        })
    }

    /// Write a KAM document in one ACID transaction, replacing any KAM with
    /// the same name.
    ///
    /// The document is validated before the transaction opens.
    pub fn put_document(&mut self, document: &KamDocument) -> Result<(), KamError> {
        let kam = document.to_kam()?;
        let previous = self.catalog.get(&document.name).copied();
        let kam_key = self.next_kam_key;

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            if let Some(old_key) = previous {
                for definition in PAIR_TABLES {
                    let mut table = write_txn.open_table(definition).map_err(storage_err)?;
                    clear_pairs(&mut table, old_key)?;
                }
                let mut orthologs = write_txn.open_table(ORTHOLOGS).map_err(storage_err)?;
                let keys = orthologs
                    .range((old_key, 0u64, 0u32)..=(old_key, u64::MAX, u32::MAX))
                    .map_err(storage_err)?
                    .map(|entry| entry.map(|(key, _)| key.value()))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(storage_err)?;
                for key in keys {
                    orthologs.remove(key).map_err(storage_err)?;
                }
                let mut info = write_txn.open_table(KAM_INFO).map_err(storage_err)?;
                info.remove(old_key).map_err(storage_err)?;
            }

            let mut catalog = write_txn.open_table(CATALOG).map_err(storage_err)?;
            catalog
                .insert(document.name.as_str(), kam_key)
                .map_err(storage_err)?;

            let mut info = write_txn.open_table(KAM_INFO).map_err(storage_err)?;
            info.insert(kam_key, encode(kam.info())?.as_slice())
                .map_err(storage_err)?;

            let mut nodes = write_txn.open_table(NODES).map_err(storage_err)?;
            for node in kam.nodes() {
                nodes
                    .insert((kam_key, node.id.0), encode(node)?.as_slice())
                    .map_err(storage_err)?;
            }

            let mut edges = write_txn.open_table(EDGES).map_err(storage_err)?;
            for edge in kam.edges() {
                edges
                    .insert((kam_key, edge.id.0), encode(edge)?.as_slice())
                    .map_err(storage_err)?;
            }

            let mut terms = write_txn.open_table(TERMS).map_err(storage_err)?;
            for (node, node_terms) in document.terms() {
                terms
                    .insert((kam_key, node.0), encode(&node_terms)?.as_slice())
                    .map_err(storage_err)?;
            }

            let mut orthologs = write_txn.open_table(ORTHOLOGS).map_err(storage_err)?;
            for ((node, taxonomy), view) in document.ortholog_table() {
                orthologs
                    .insert((kam_key, node.0, taxonomy.0), encode(&view)?.as_slice())
                    .map_err(storage_err)?;
            }

            let dialect = document.dialect_table();
            let mut dialect_nodes = write_txn.open_table(DIALECT_NODES).map_err(storage_err)?;
            for (node, view) in dialect.node_overrides() {
                dialect_nodes
                    .insert((kam_key, node.0), encode(view)?.as_slice())
                    .map_err(storage_err)?;
            }
            let mut dialect_edges = write_txn.open_table(DIALECT_EDGES).map_err(storage_err)?;
            for (edge, relationship) in dialect.edge_overrides() {
                dialect_edges
                    .insert((kam_key, edge.0), encode(&relationship)?.as_slice())
                    .map_err(storage_err)?;
            }

            let mut meta = write_txn.open_table(METADATA).map_err(storage_err)?;
            meta.insert("next_kam_key", kam_key.saturating_add(1))
                .map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;

        self.catalog.insert(document.name.clone(), kam_key);
        self.next_kam_key = kam_key.saturating_add(1);
        Ok(())
    }

    fn kam_key(&self, name: &str) -> Result<u64, KamError> {
        self.catalog
            .get(name)
            .copied()
            .ok_or_else(|| KamError::KamNotFound(name.to_string()))
    }

    fn read_terms(
        &self,
        txn: &ReadTransaction,
        kam_key: u64,
    ) -> Result<BTreeMap<NodeId, Vec<BelTerm>>, KamError> {
        Ok(read_pairs::<Vec<BelTerm>>(txn, TERMS, kam_key)?
            .into_iter()
            .map(|(node, terms)| (NodeId(node), terms))
            .collect())
    }

    fn read_orthologs(
        &self,
        txn: &ReadTransaction,
        kam_key: u64,
    ) -> Result<BTreeMap<(NodeId, TaxonomyId), NodeView>, KamError> {
        let table = txn.open_table(ORTHOLOGS).map_err(storage_err)?;
        let mut orthologs = BTreeMap::new();
        for entry in table
            .range((kam_key, 0u64, 0u32)..=(kam_key, u64::MAX, u32::MAX))
            .map_err(storage_err)?
        {
            let (key, value) = entry.map_err(storage_err)?;
            let (_, node, taxonomy) = key.value();
            orthologs.insert((NodeId(node), TaxonomyId(taxonomy)), decode(value.value())?);
        }
        Ok(orthologs)
    }

    fn read_dialect(&self, txn: &ReadTransaction, kam_key: u64) -> Result<DialectTable, KamError> {
        let mut table = DialectTable::new();
        for (node, view) in read_pairs::<NodeView>(txn, DIALECT_NODES, kam_key)? {
            table.insert_node(NodeId(node), view);
        }
        for (edge, relationship) in read_pairs::<RelationshipType>(txn, DIALECT_EDGES, kam_key)? {
            table.insert_edge(EdgeId(edge), relationship);
        }
        Ok(table)
    }

    fn read_info(&self, txn: &ReadTransaction, kam_key: u64) -> Result<KamInfo, KamError> {
        let table = txn.open_table(KAM_INFO).map_err(storage_err)?;
        let guard = table
            .get(kam_key)
            .map_err(storage_err)?
            .ok_or_else(|| {
                KamError::IoError(format!("Catalog key {} has no KAM info", kam_key))
            })?;
        decode(guard.value())
    }

    fn read_kam(&self, txn: &ReadTransaction, kam_key: u64) -> Result<Kam, KamError> {
        let mut kam = Kam::new(self.read_info(txn, kam_key)?);
        for (_, node) in read_pairs::<KamNode>(txn, NODES, kam_key)? {
            kam.insert_node(node);
        }
        for (_, edge) in read_pairs::<KamEdge>(txn, EDGES, kam_key)? {
            kam.insert_edge(edge)?;
        }
        Ok(kam)
    }
}

impl TermSupport for RedbKamStore {
    fn supporting_terms(&self, kam: &KamInfo, node: NodeId) -> Result<Vec<BelTerm>, KamError> {
        let kam_key = self.kam_key(&kam.name)?;
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(TERMS).map_err(storage_err)?;
        match table.get((kam_key, node.0)).map_err(storage_err)? {
            Some(guard) => decode(guard.value()),
            None => Ok(Vec::new()),
        }
    }
}

impl KamStore for RedbKamStore {
    fn get_kam(&self, name: &str) -> Result<Option<Kam>, KamError> {
        let Some(&kam_key) = self.catalog.get(name) else {
            return Ok(None);
        };
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        self.read_kam(&read_txn, kam_key).map(Some)
    }

    fn kam_names(&self) -> Result<Vec<String>, KamError> {
        Ok(self.catalog.keys().cloned().collect())
    }

    fn ortholog(
        &self,
        kam: &KamInfo,
        node: NodeId,
        taxonomy: TaxonomyId,
    ) -> Result<Option<NodeView>, KamError> {
        let kam_key = self.kam_key(&kam.name)?;
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(ORTHOLOGS).map_err(storage_err)?;
        table
            .get((kam_key, node.0, taxonomy.0))
            .map_err(storage_err)?
            .map(|guard| decode(guard.value()))
            .transpose()
    }

    fn dialect_table(&self, kam: &KamInfo) -> Result<DialectTable, KamError> {
        let kam_key = self.kam_key(&kam.name)?;
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        self.read_dialect(&read_txn, kam_key)
    }

    fn export_document(&self, name: &str) -> Result<Option<KamDocument>, KamError> {
        let Some(&kam_key) = self.catalog.get(name) else {
            return Ok(None);
        };
        // One read transaction: the document is a consistent snapshot.
        // Rows go straight into the document; stored KAMs were validated on write.
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let info = self.read_info(&read_txn, kam_key)?;
        let mut terms = self.read_terms(&read_txn, kam_key)?;
        let nodes = read_pairs::<KamNode>(&read_txn, NODES, kam_key)?
            .into_iter()
            .map(|(_, node)| DocumentNode {
                terms: terms.remove(&node.id).unwrap_or_default(),
                id: node.id,
                function: node.function,
                label: node.label,
            })
            .collect();
        let edges = read_pairs::<KamEdge>(&read_txn, EDGES, kam_key)?
            .into_iter()
            .map(|(_, edge)| edge)
            .collect();
        let orthologs = self.read_orthologs(&read_txn, kam_key)?;
        let dialect = self.read_dialect(&read_txn, kam_key)?;
        Ok(Some(KamDocument::from_rows(
            info, nodes, edges, &orthologs, &dialect,
        )))
    }
}

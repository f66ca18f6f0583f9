//! # PKAM Snapshot Format
//!
//! A dense, self-contained binary snapshot of one stored KAM.
//!
//! Format:
//! ```text
//! [header_len: u32 LE] [SnapshotHeader (postcard)] [KamDocument (postcard)]
//! ```
//!
//! The checksum in the header is computed from the document before it is
//! written, so the document is streamed straight to the output.
//!
//! Snapshots always carry the canonical KAM as stored. No dialect or
//! orthology substitution is applied: a snapshot can be re-orthologized
//! later for any species.

use crate::formats::document::KamDocument;
use crate::primitives::{
    MAX_SNAPSHOT_EDGE_COUNT, MAX_SNAPSHOT_NODE_COUNT, SNAPSHOT_MAGIC, SNAPSHOT_VERSION,
};
use crate::storage::KamStore;
use crate::KamError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// =============================================================================
// HEADER
// =============================================================================

/// Header of a PKAM snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotHeader {
    /// Magic bytes to identify the format.
    pub magic: [u8; 4],

    /// Format version for compatibility.
    pub version: u8,

    /// Number of nodes in the document.
    pub node_count: u64,

    /// Number of edges in the document.
    pub edge_count: u64,

    /// Checksum of the document (XOR-based, deterministic).
    pub checksum: u64,
}

impl SnapshotHeader {
    /// Build the header describing `document`.
    #[must_use]
    pub fn for_document(document: &KamDocument) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: SNAPSHOT_VERSION,
            node_count: document.nodes.len() as u64,
            edge_count: document.edges.len() as u64,
            checksum: document_checksum(document),
        }
    }

    /// Validate magic, version and size limits.
    pub fn validate(&self) -> Result<(), KamError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(KamError::SerializationError(
                "Not a PKAM snapshot".to_string(),
            ));
        }
        if self.version != SNAPSHOT_VERSION {
            return Err(KamError::SerializationError(format!(
                "Unsupported snapshot version: {} (expected {})",
                self.version, SNAPSHOT_VERSION
            )));
        }
        if self.node_count > MAX_SNAPSHOT_NODE_COUNT {
            return Err(KamError::SerializationError(format!(
                "Node count {} exceeds maximum allowed {}",
                self.node_count, MAX_SNAPSHOT_NODE_COUNT
            )));
        }
        if self.edge_count > MAX_SNAPSHOT_EDGE_COUNT {
            return Err(KamError::SerializationError(format!(
                "Edge count {} exceeds maximum allowed {}",
                self.edge_count, MAX_SNAPSHOT_EDGE_COUNT
            )));
        }
        Ok(())
    }
}

fn hash_bytes(hash: &mut u64, bytes: &[u8], rotation: u32) {
    for byte in bytes {
        *hash = hash.rotate_left(1) ^ (*byte as u64).rotate_left(rotation);
    }
}

/// Deterministic checksum of a document.
///
/// **NOT** a cryptographic hash: it detects accidental corruption only.
/// Enable the `crypto-hash` feature for a BLAKE3 digest.
#[must_use]
pub fn document_checksum(document: &KamDocument) -> u64 {
    let mut hash: u64 = 0;

    hash_bytes(&mut hash, document.name.as_bytes(), 3);
    hash_bytes(&mut hash, document.description.as_bytes(), 5);

    for node in &document.nodes {
        hash ^= node.id.0.rotate_left(13);
        hash ^= (node.function as u64).rotate_left(7);
        hash_bytes(&mut hash, node.label.as_bytes(), 23);
        for term in &node.terms {
            hash_bytes(&mut hash, term.as_str().as_bytes(), 29);
        }
    }

    for edge in &document.edges {
        hash ^= edge.id.0.rotate_left(31);
        hash ^= edge.source.0.rotate_left(17);
        hash ^= edge.target.0.rotate_left(11);
        hash ^= (edge.relationship as u64).rotate_left(5);
    }

    for ortholog in &document.orthologs {
        hash ^= ortholog.node.0.rotate_left(19);
        hash ^= (ortholog.taxonomy.0 as u64).rotate_left(37);
        hash_bytes(&mut hash, ortholog.label.as_bytes(), 41);
    }

    for entry in &document.display {
        hash ^= entry.node.0.rotate_left(43);
        hash_bytes(&mut hash, entry.label.as_bytes(), 47);
    }

    for entry in &document.edge_overrides {
        hash ^= entry.edge.0.rotate_left(53);
        hash ^= (entry.relationship as u64).rotate_left(59);
    }

    hash
}

// =============================================================================
// WRITE / READ
// =============================================================================

/// Stream `document` as a PKAM snapshot into `out`.
pub fn write_snapshot<W: Write>(
    document: &KamDocument,
    mut out: W,
) -> Result<SnapshotHeader, KamError> {
    let header = SnapshotHeader::for_document(document);
    let header_bytes = postcard::to_allocvec(&header)
        .map_err(|e| KamError::SerializationError(format!("Header: {}", e)))?;

    out.write_all(&(header_bytes.len() as u32).to_le_bytes())
        .map_err(|e| KamError::IoError(e.to_string()))?;
    out.write_all(&header_bytes)
        .map_err(|e| KamError::IoError(e.to_string()))?;
    postcard::to_io(document, &mut out)
        .map_err(|e| KamError::SerializationError(format!("Data: {}", e)))?;
    out.flush().map_err(|e| KamError::IoError(e.to_string()))?;

    Ok(header)
}

/// Decode a PKAM snapshot.
///
/// Validates the header (magic, version, size limits) before decoding the
/// document, then checks counts and checksum against the header.
pub fn read_snapshot(data: &[u8]) -> Result<(SnapshotHeader, KamDocument), KamError> {
    if data.len() < 4 {
        return Err(KamError::SerializationError(
            "Snapshot too short".to_string(),
        ));
    }

    let header_len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    let body = &data[4..];
    if body.len() < header_len {
        return Err(KamError::SerializationError(
            "Snapshot too short for header".to_string(),
        ));
    }

    let header: SnapshotHeader = postcard::from_bytes(&body[..header_len])
        .map_err(|e| KamError::SerializationError(format!("Header: {}", e)))?;
    header.validate()?;

    let document: KamDocument = postcard::from_bytes(&body[header_len..])
        .map_err(|e| KamError::SerializationError(format!("Data: {}", e)))?;

    if document.nodes.len() as u64 != header.node_count {
        return Err(KamError::SerializationError(
            "Node count mismatch".to_string(),
        ));
    }
    if document.edges.len() as u64 != header.edge_count {
        return Err(KamError::SerializationError(
            "Edge count mismatch".to_string(),
        ));
    }
    let computed = document_checksum(&document);
    if computed != header.checksum {
        return Err(KamError::SerializationError(format!(
            "Checksum mismatch: expected {}, got {}",
            header.checksum, computed
        )));
    }

    Ok((header, document))
}

/// Check whether `data` starts like a PKAM snapshot.
#[must_use]
pub fn looks_like_snapshot(data: &[u8]) -> bool {
    read_header(data).is_some_and(|header| header.magic == SNAPSHOT_MAGIC)
}

fn read_header(data: &[u8]) -> Option<SnapshotHeader> {
    let len_bytes: [u8; 4] = data.get(..4)?.try_into().ok()?;
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    let header_bytes = data.get(4..4usize.checked_add(header_len)?)?;
    postcard::from_bytes(header_bytes).ok()
}

/// BLAKE3 digest of a snapshot file, hex-encoded.
#[cfg(feature = "crypto-hash")]
pub fn snapshot_digest(path: &Path) -> Result<String, KamError> {
    let data = std::fs::read(path).map_err(|e| KamError::IoError(e.to_string()))?;
    Ok(blake3::hash(&data).to_hex().to_string())
}

// =============================================================================
// SNAPSHOT SERVICE
// =============================================================================

/// What goes into a snapshot besides the graph itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotOptions {
    pub include_terms: bool,
    pub include_orthologs: bool,
    pub include_dialect: bool,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            include_terms: true,
            include_orthologs: true,
            include_dialect: true,
        }
    }
}

impl SnapshotOptions {
    fn apply(&self, document: &mut KamDocument) {
        if !self.include_terms {
            for node in &mut document.nodes {
                node.terms.clear();
            }
        }
        if !self.include_orthologs {
            document.orthologs.clear();
        }
        if !self.include_dialect {
            document.display.clear();
            document.edge_overrides.clear();
        }
    }
}

/// Serializes a stored KAM to a PKAM snapshot file.
pub trait SnapshotService {
    fn serialize(
        &self,
        kam_name: &str,
        destination: &Path,
        options: Option<&SnapshotOptions>,
    ) -> Result<SnapshotHeader, KamError>;
}

/// Snapshot service reading straight from a `KamStore`.
#[derive(Debug)]
pub struct DefaultSnapshotService<'a, S> {
    store: &'a S,
}

impl<'a, S: KamStore> DefaultSnapshotService<'a, S> {
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }
}

impl<S: KamStore> SnapshotService for DefaultSnapshotService<'_, S> {
    fn serialize(
        &self,
        kam_name: &str,
        destination: &Path,
        options: Option<&SnapshotOptions>,
    ) -> Result<SnapshotHeader, KamError> {
        let mut document = self
            .store
            .export_document(kam_name)?
            .ok_or_else(|| KamError::KamNotFound(kam_name.to_string()))?;
        options.copied().unwrap_or_default().apply(&mut document);

        let file = File::create(destination).map_err(|e| {
            KamError::IoError(format!("Cannot create '{}': {}", destination.display(), e))
        })?;
        let mut out = BufWriter::new(file);
        let result = write_snapshot(&document, &mut out);
        let flushed = out.flush().map_err(|e| KamError::IoError(e.to_string()));

        let header = result?;
        flushed?;
        Ok(header)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::document::{DocumentNode, OrthologEntry};
    use crate::graph::KamEdge;
    use crate::storage::{MemoryKamStore, RedbKamStore};
    use crate::{BelTerm, EdgeId, FunctionType, NodeId, RelationshipType, TaxonomyId};
    use tempfile::tempdir;

    fn sample() -> KamDocument {
        let mut doc = KamDocument::new("snap");
        let mut a = DocumentNode::new(NodeId(1), FunctionType::ProteinAbundance, "A");
        a.terms.push(BelTerm::new("p(HGNC:A)"));
        doc.nodes.push(a);
        doc.nodes
            .push(DocumentNode::new(NodeId(2), FunctionType::Pathology, "B"));
        doc.edges.push(KamEdge::new(
            EdgeId(3),
            RelationshipType::PositiveCorrelation,
            NodeId(1),
            NodeId(2),
        ));
        doc.orthologs.push(OrthologEntry {
            node: NodeId(1),
            taxonomy: TaxonomyId(10116),
            function: FunctionType::ProteinAbundance,
            label: "A_rat".to_string(),
        });
        doc
    }

    fn encoded(doc: &KamDocument) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_snapshot(doc, &mut bytes).expect("write");
        bytes
    }

    #[test]
    fn snapshot_roundtrip() {
        let doc = sample();
        let (header, restored) = read_snapshot(&encoded(&doc)).expect("read");
        assert_eq!(restored, doc);
        assert_eq!(header.node_count, 2);
        assert_eq!(header.edge_count, 1);
    }

    #[test]
    fn snapshot_is_deterministic() {
        let doc = sample();
        assert_eq!(encoded(&doc), encoded(&doc));
    }

    #[test]
    fn detects_snapshot_magic() {
        assert!(looks_like_snapshot(&encoded(&sample())));
        assert!(!looks_like_snapshot(br#"{"name":"x"}"#));
        assert!(!looks_like_snapshot(&[]));
    }

    #[test]
    fn corrupted_empty_data() {
        assert!(read_snapshot(&[]).is_err());
    }

    #[test]
    fn corrupted_header_length_exceeds_data() {
        let data = [255u8, 0, 0, 0, 1, 2];
        assert!(matches!(
            read_snapshot(&data),
            Err(KamError::SerializationError(_))
        ));
    }

    #[test]
    fn corrupted_invalid_magic() {
        let doc = sample();
        let mut header = SnapshotHeader::for_document(&doc);
        header.magic = *b"XXXX";
        let header_bytes = postcard::to_allocvec(&header).expect("header");
        let mut data = (header_bytes.len() as u32).to_le_bytes().to_vec();
        data.extend_from_slice(&header_bytes);
        data.extend_from_slice(&postcard::to_allocvec(&doc).expect("doc"));

        assert!(read_snapshot(&data).is_err());
    }

    #[test]
    fn corrupted_checksum_mismatch() {
        let doc = sample();
        let mut header = SnapshotHeader::for_document(&doc);
        header.checksum ^= 1;
        let header_bytes = postcard::to_allocvec(&header).expect("header");
        let mut data = (header_bytes.len() as u32).to_le_bytes().to_vec();
        data.extend_from_slice(&header_bytes);
        data.extend_from_slice(&postcard::to_allocvec(&doc).expect("doc"));

        let err = read_snapshot(&data).expect_err("must fail");
        assert!(err.to_string().contains("Checksum mismatch"));
    }

    #[test]
    fn corrupted_excessive_node_count() {
        let mut header = SnapshotHeader::for_document(&sample());
        header.node_count = MAX_SNAPSHOT_NODE_COUNT + 1;
        assert!(header.validate().is_err());
    }

    #[test]
    fn service_writes_canonical_kam() {
        let temp = tempdir().expect("temp dir");
        let mut store = MemoryKamStore::new();
        store.insert(sample()).expect("insert");
        let path = temp.path().join("snap.kam");

        let header = DefaultSnapshotService::new(&store)
            .serialize("snap", &path, None)
            .expect("serialize");
        assert_eq!(header.node_count, 2);

        let data = std::fs::read(&path).expect("read file");
        let (_, restored) = read_snapshot(&data).expect("decode");
        // Original labels, not orthologs.
        assert_eq!(restored.nodes[0].label, "A");
        assert_eq!(restored.orthologs.len(), 1);
    }

    #[test]
    fn service_honours_options() {
        let temp = tempdir().expect("temp dir");
        let mut store = MemoryKamStore::new();
        store.insert(sample()).expect("insert");
        let path = temp.path().join("slim.kam");
        let options = SnapshotOptions {
            include_terms: false,
            include_orthologs: false,
            include_dialect: true,
        };

        DefaultSnapshotService::new(&store)
            .serialize("snap", &path, Some(&options))
            .expect("serialize");
        let (_, restored) = read_snapshot(&std::fs::read(&path).expect("read")).expect("decode");
        assert!(restored.nodes.iter().all(|n| n.terms.is_empty()));
        assert!(restored.orthologs.is_empty());
    }

    #[test]
    fn service_reports_missing_kam() {
        let temp = tempdir().expect("temp dir");
        let store = MemoryKamStore::new();
        let path = temp.path().join("g.kam");
        let result = DefaultSnapshotService::new(&store).serialize("ghost", &path, None);
        assert!(matches!(result, Err(KamError::KamNotFound(_))));
        assert!(!path.exists());
    }

    #[test]
    fn service_writes_redb_rows_unchanged() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbKamStore::create(temp.path().join("kam.redb")).expect("create");
        store.put_document(&sample()).expect("put");
        let path = temp.path().join("snap.kam");

        let header = DefaultSnapshotService::new(&store)
            .serialize("snap", &path, None)
            .expect("serialize");
        let (read_header, restored) =
            read_snapshot(&std::fs::read(&path).expect("read")).expect("decode");
        assert_eq!(read_header, header);
        assert_eq!(restored, sample());
    }
}

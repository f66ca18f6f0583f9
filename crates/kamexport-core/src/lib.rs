//! # kamexport-core
//!
//! The deterministic, orthology-aware KAM export pipeline.
//!
//! A Knowledge Assembly Model (KAM) is a directed graph of typed biological
//! entities and relationships. This crate views a stored KAM through a
//! dialect chain (identity, generic dialect, species orthology) and streams
//! it to XGMML, or writes the canonical KAM as a PKAM snapshot.
//!
//! ## Architectural Constraints
//!
//! - Synchronous and single-threaded: one export runs to completion
//! - Deterministic: `BTreeMap` everywhere, byte-identical output on rerun
//! - Never prints or logs: every failure is a typed `KamError`
//! - Dialect layers change presentation only, never identifiers or topology

// =============================================================================
// MODULES
// =============================================================================

pub mod dialect;
pub mod export;
pub mod formats;
pub mod graph;
pub mod primitives;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use types::{
    BelTerm, EdgeId, FunctionType, KamError, NodeId, NodeView, RelationshipType, TaxonomyId,
};

pub use dialect::{DialectChain, DialectTable, ResolvedEdge, ResolvedNode};
pub use export::{
    ExportOutcome, ExportRequest, ExportType, export_kam, export_loaded, load_kam,
    parse_taxonomy_id,
};
pub use formats::document::KamDocument;
pub use formats::snapshot::{
    DefaultSnapshotService, SnapshotHeader, SnapshotOptions, SnapshotService, read_snapshot,
    write_snapshot,
};
pub use formats::xgmml::{XgmmlSummary, export_xgmml_file, write_xgmml};
pub use graph::{Kam, KamEdge, KamInfo, KamNode};
pub use storage::{KamStore, MemoryKamStore, RedbKamStore, TermSupport};

//! # Export Primitives
//!
//! Fixed constants of the export formats.
//!
//! These are compiled into the binary and are immutable at runtime.

/// Magic bytes of the PKAM snapshot header.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"PKAM";

/// Current PKAM snapshot format version.
///
/// Increment this when making breaking changes to the snapshot layout.
pub const SNAPSHOT_VERSION: u8 = 1;

/// Maximum node count accepted when reading a snapshot.
///
/// Checked against the header before the document is decoded.
pub const MAX_SNAPSHOT_NODE_COUNT: u64 = 5_000_000;

/// Maximum edge count accepted when reading a snapshot.
pub const MAX_SNAPSHOT_EDGE_COUNT: u64 = 50_000_000;

/// Maximum size of a snapshot file accepted for reading (1 GB).
pub const MAX_SNAPSHOT_SIZE: u64 = 1024 * 1024 * 1024;

/// File extension of XGMML exports.
pub const XGMML_EXTENSION: &str = "xgmml";

/// File extension of PKAM snapshot exports.
pub const SNAPSHOT_EXTENSION: &str = "kam";

/// Prefix of the XGMML graph title; the KAM name follows.
pub const XGMML_TITLE_PREFIX: &str = "Species-specific KAM for ";

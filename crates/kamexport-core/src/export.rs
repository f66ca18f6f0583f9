//! # Export Pipeline
//!
//! Selection validation and the one-shot export of a single named KAM.
//!
//! ```text
//! (kam, taxid, type) -> ExportRequest -> load_kam -> export_loaded
//!   |- XGMML: Species(Dialect(Identity)) -> xgmml writer
//!   '- KAM:   canonical document -> PKAM snapshot
//! ```
//!
//! Validation never touches a store: an `ExportRequest` can only exist once
//! every selection input is present and well formed.

use crate::dialect::DialectChain;
use crate::formats::snapshot::{DefaultSnapshotService, SnapshotService};
use crate::formats::xgmml::export_xgmml_file;
use crate::graph::Kam;
use crate::primitives::{SNAPSHOT_EXTENSION, XGMML_EXTENSION};
use crate::storage::KamStore;
use crate::{KamError, TaxonomyId};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// =============================================================================
// EXPORT TYPE
// =============================================================================

/// The two export targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportType {
    /// XGMML graph markup, orthologized.
    Xgmml,
    /// PKAM snapshot of the canonical KAM.
    Snapshot,
}

impl ExportType {
    /// File extension of the output, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Xgmml => XGMML_EXTENSION,
            Self::Snapshot => SNAPSHOT_EXTENSION,
        }
    }
}

impl FromStr for ExportType {
    type Err = KamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("XGMML") {
            Ok(Self::Xgmml)
        } else if s.eq_ignore_ascii_case("KAM") {
            Ok(Self::Snapshot)
        } else {
            Err(KamError::InvalidInput(format!(
                "The export type '{}' is not supported. Provide either XGMML or KAM.",
                s
            )))
        }
    }
}

impl fmt::Display for ExportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xgmml => write!(f, "XGMML"),
            Self::Snapshot => write!(f, "KAM"),
        }
    }
}

// =============================================================================
// REQUEST
// =============================================================================

/// A validated export selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub kam_name: String,
    pub taxonomy: TaxonomyId,
    pub export_type: ExportType,
}

fn required<'s>(value: Option<&'s str>, missing: &str) -> Result<&'s str, KamError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| KamError::InvalidInput(missing.to_string()))
}

impl ExportRequest {
    /// Validate raw selection inputs.
    ///
    /// Presence of all three inputs is checked first, then the taxonomy id,
    /// then the export type. Nothing here touches configuration or a store.
    pub fn from_selection(
        kam: Option<&str>,
        taxonomy: Option<&str>,
        export_type: Option<&str>,
    ) -> Result<Self, KamError> {
        let kam = required(kam, "The KAM name was not provided.")?;
        let taxonomy = required(taxonomy, "The species taxonomy id was not provided.")?;
        let export_type = required(export_type, "The export type was not provided.")?;

        Ok(Self {
            kam_name: kam.to_string(),
            taxonomy: parse_taxonomy_id(taxonomy)?,
            export_type: export_type.parse()?,
        })
    }

    /// Output file name: `<kam>.xgmml` or `<kam>.kam`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.kam_name, self.export_type.extension())
    }
}

/// Parse a taxonomy id. Only plain decimal digits are accepted.
pub fn parse_taxonomy_id(raw: &str) -> Result<TaxonomyId, KamError> {
    let raw = raw.trim();
    let not_a_number = || KamError::InvalidInput("The species taxonomy id is not a number.".into());
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_a_number());
    }
    raw.parse::<u32>()
        .map(TaxonomyId)
        .map_err(|_| not_a_number())
}

// =============================================================================
// PIPELINE
// =============================================================================

/// What an export produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub export_type: ExportType,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Load a KAM by name, or `KamNotFound`.
pub fn load_kam<S: KamStore>(store: &S, name: &str) -> Result<Kam, KamError> {
    store
        .get_kam(name)?
        .ok_or_else(|| KamError::KamNotFound(name.to_string()))
}

/// Export an already loaded KAM into `out_dir`.
pub fn export_loaded<S: KamStore>(
    store: &S,
    kam: &Kam,
    request: &ExportRequest,
    out_dir: &Path,
) -> Result<ExportOutcome, KamError> {
    let path = out_dir.join(request.file_name());

    let (node_count, edge_count) = match request.export_type {
        ExportType::Xgmml => {
            let chain = DialectChain::orthologized(kam, store, request.taxonomy)?;
            let summary = export_xgmml_file(&chain, store, &path)?;
            (summary.node_count, summary.edge_count)
        }
        ExportType::Snapshot => {
            let header = DefaultSnapshotService::new(store).serialize(kam.name(), &path, None)?;
            (header.node_count as usize, header.edge_count as usize)
        }
    };

    Ok(ExportOutcome {
        path,
        export_type: request.export_type,
        node_count,
        edge_count,
    })
}

/// Load and export in one step.
pub fn export_kam<S: KamStore>(
    store: &S,
    request: &ExportRequest,
    out_dir: &Path,
) -> Result<ExportOutcome, KamError> {
    let kam = load_kam(store, &request.kam_name)?;
    export_loaded(store, &kam, request, out_dir)
}

// =============================================================================
// TESTS
// =============================================================================

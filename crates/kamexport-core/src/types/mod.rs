//! # Core Type Definitions
//!
//! This module contains the core types for the KAM export engine:
//! - Graph identifiers (`NodeId`, `EdgeId`) and species identifiers (`TaxonomyId`)
//! - BEL vocabularies (`FunctionType`, `RelationshipType`)
//! - Presentation values (`NodeView`, `BelTerm`)
//! - Error types (`KamError`)
//!
//! ## Determinism Guarantees
//!
//! All identifier types implement `Ord` so they can key `BTreeMap`s, which
//! keeps every iteration order (and therefore every export) reproducible.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Stable identifier of a KAM node, assigned by the originating store.
///
/// Never reassigned during export: it is the join key across dialect layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Stable identifier of a KAM edge, assigned by the originating store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub u64);

/// NCBI species taxonomy identifier (e.g. 9606 for human).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaxonomyId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TaxonomyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// FUNCTION TYPE
// =============================================================================

/// The BEL function of a KAM node: which biological entity category it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FunctionType {
    Abundance,
    BiologicalProcess,
    CatalyticActivity,
    CellSecretion,
    CellSurfaceExpression,
    ChaperoneActivity,
    ComplexAbundance,
    CompositeAbundance,
    Degradation,
    GeneAbundance,
    GtpBoundActivity,
    KinaseActivity,
    #[serde(rename = "microRNAAbundance")]
    MicroRnaAbundance,
    MolecularActivity,
    Pathology,
    PeptidaseActivity,
    PhosphataseActivity,
    ProteinAbundance,
    ProteinModification,
    Reaction,
    RibosylationActivity,
    RnaAbundance,
    Substitution,
    TranscriptionalActivity,
    Translocation,
    TransportActivity,
    Truncation,
    Unknown,
}

impl FunctionType {
    /// The long BEL name, as written into XGMML `function type` attributes.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Abundance => "abundance",
            Self::BiologicalProcess => "biologicalProcess",
            Self::CatalyticActivity => "catalyticActivity",
            Self::CellSecretion => "cellSecretion",
            Self::CellSurfaceExpression => "cellSurfaceExpression",
            Self::ChaperoneActivity => "chaperoneActivity",
            Self::ComplexAbundance => "complexAbundance",
            Self::CompositeAbundance => "compositeAbundance",
            Self::Degradation => "degradation",
            Self::GeneAbundance => "geneAbundance",
            Self::GtpBoundActivity => "gtpBoundActivity",
            Self::KinaseActivity => "kinaseActivity",
            Self::MicroRnaAbundance => "microRNAAbundance",
            Self::MolecularActivity => "molecularActivity",
            Self::Pathology => "pathology",
            Self::PeptidaseActivity => "peptidaseActivity",
            Self::PhosphataseActivity => "phosphataseActivity",
            Self::ProteinAbundance => "proteinAbundance",
            Self::ProteinModification => "proteinModification",
            Self::Reaction => "reaction",
            Self::RibosylationActivity => "ribosylationActivity",
            Self::RnaAbundance => "rnaAbundance",
            Self::Substitution => "substitution",
            Self::TranscriptionalActivity => "transcriptionalActivity",
            Self::Translocation => "translocation",
            Self::TransportActivity => "transportActivity",
            Self::Truncation => "truncation",
            Self::Unknown => "unknown",
        }
    }

    /// The short BEL abbreviation (`p`, `g`, `kin`, ...), used in edge labels.
    #[must_use]
    pub const fn abbreviation(self) -> &'static str {
        match self {
            Self::Abundance => "a",
            Self::BiologicalProcess => "bp",
            Self::CatalyticActivity => "cat",
            Self::CellSecretion => "sec",
            Self::CellSurfaceExpression => "surf",
            Self::ChaperoneActivity => "chap",
            Self::ComplexAbundance => "complex",
            Self::CompositeAbundance => "composite",
            Self::Degradation => "deg",
            Self::GeneAbundance => "g",
            Self::GtpBoundActivity => "gtp",
            Self::KinaseActivity => "kin",
            Self::MicroRnaAbundance => "m",
            Self::MolecularActivity => "act",
            Self::Pathology => "path",
            Self::PeptidaseActivity => "pep",
            Self::PhosphataseActivity => "phos",
            Self::ProteinAbundance => "p",
            Self::ProteinModification => "pmod",
            Self::Reaction => "rxn",
            Self::RibosylationActivity => "ribo",
            Self::RnaAbundance => "r",
            Self::Substitution => "sub",
            Self::TranscriptionalActivity => "tscript",
            Self::Translocation => "tloc",
            Self::TransportActivity => "tport",
            Self::Truncation => "trunc",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// =============================================================================
// RELATIONSHIP TYPE
// =============================================================================

/// The BEL relationship carried by a KAM edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipType {
    Increases,
    DirectlyIncreases,
    Decreases,
    DirectlyDecreases,
    CausesNoChange,
    RateLimitingStepOf,
    PositiveCorrelation,
    NegativeCorrelation,
    Association,
    BiomarkerFor,
    PrognosticBiomarkerFor,
    SubProcessOf,
    IsA,
    TranscribedTo,
    TranslatedTo,
    Orthologous,
    Analogous,
    HasMember,
    HasComponent,
    HasModification,
    HasVariant,
    HasProduct,
    ReactantIn,
    ActsIn,
    Translocates,
}

impl RelationshipType {
    /// The long BEL name, as written into XGMML `relationship type` attributes.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Increases => "increases",
            Self::DirectlyIncreases => "directlyIncreases",
            Self::Decreases => "decreases",
            Self::DirectlyDecreases => "directlyDecreases",
            Self::CausesNoChange => "causesNoChange",
            Self::RateLimitingStepOf => "rateLimitingStepOf",
            Self::PositiveCorrelation => "positiveCorrelation",
            Self::NegativeCorrelation => "negativeCorrelation",
            Self::Association => "association",
            Self::BiomarkerFor => "biomarkerFor",
            Self::PrognosticBiomarkerFor => "prognosticBiomarkerFor",
            Self::SubProcessOf => "subProcessOf",
            Self::IsA => "isA",
            Self::TranscribedTo => "transcribedTo",
            Self::TranslatedTo => "translatedTo",
            Self::Orthologous => "orthologous",
            Self::Analogous => "analogous",
            Self::HasMember => "hasMember",
            Self::HasComponent => "hasComponent",
            Self::HasModification => "hasModification",
            Self::HasVariant => "hasVariant",
            Self::HasProduct => "hasProduct",
            Self::ReactantIn => "reactantIn",
            Self::ActsIn => "actsIn",
            Self::Translocates => "translocates",
        }
    }

    /// Whether this relationship asserts causation.
    #[must_use]
    pub const fn is_causal(self) -> bool {
        matches!(
            self,
            Self::Increases
                | Self::DirectlyIncreases
                | Self::Decreases
                | Self::DirectlyDecreases
                | Self::CausesNoChange
                | Self::RateLimitingStepOf
        )
    }

    /// Whether this relationship asserts correlation only.
    #[must_use]
    pub const fn is_correlative(self) -> bool {
        matches!(
            self,
            Self::PositiveCorrelation | Self::NegativeCorrelation | Self::Association
        )
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// =============================================================================
// PRESENTATION VALUES
// =============================================================================

/// The presentation of a node: everything a dialect layer may substitute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeView {
    /// The BEL function of the node.
    pub function: FunctionType,
    /// The display label of the node.
    pub label: String,
}

impl NodeView {
    /// Create a new node view.
    #[must_use]
    pub fn new(function: FunctionType, label: impl Into<String>) -> Self {
        Self {
            function,
            label: label.into(),
        }
    }
}

/// A supporting BEL term: the textual provenance behind a KAM node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BelTerm(pub String);

impl BelTerm {
    /// Create a new term from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the term as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while exporting a KAM.
///
/// Every variant is fatal at the top level: nothing is retried and no
/// variant degrades into a partially successful export.
#[derive(Debug, Error)]
pub enum KamError {
    /// Required environment or configuration is missing or unreadable.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A selection input (KAM name, taxonomy id, export type) is missing or malformed.
    #[error("{0}")]
    InvalidInput(String),

    /// The named KAM does not exist in the store.
    #[error("The specified KAM '{0}' cannot be found.")]
    KamNotFound(String),

    /// The requested node is not part of the KAM.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// The requested edge is not part of the KAM.
    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),

    /// An edge references a node that is not part of the same KAM.
    #[error("Edge {edge} references missing node {node}")]
    DanglingEdge { edge: EdgeId, node: NodeId },

    /// A serialization or snapshot codec failure, with its reason.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl KamError {
    /// Whether this error came from validating the user's selection.
    ///
    /// The binary prints usage text for these.
    #[must_use]
    pub const fn is_usage_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! # XGMML Writer
//!
//! Streams a dialect-resolved KAM as XGMML (eXtensible Graph Markup and
//! Modeling Language), the graph format read by Cytoscape.
//!
//! The document is written in three phases, never buffered whole:
//!
//! ```text
//! header   <?xml ...?> <graph label="..." ...>
//! nodes    one <node> per KAM node, with its supporting terms
//! edges    one <edge> per KAM edge, endpoints re-resolved through the chain
//! footer   </graph>
//! ```

use crate::dialect::{DialectChain, ResolvedEdge, ResolvedNode};
use crate::primitives::XGMML_TITLE_PREFIX;
use crate::storage::{KamStore, TermSupport};
use crate::{BelTerm, FunctionType, KamError, NodeId, RelationshipType};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const GRAPH_NAMESPACES: &str = concat!(
    r#"xmlns:dc="http://purl.org/dc/elements/1.1/" "#,
    r#"xmlns:xlink="http://www.w3.org/1999/xlink" "#,
    r#"xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" "#,
    r#"xmlns:cy="http://www.cytoscape.org" "#,
    r#"xmlns="http://www.cs.rpi.edu/XGMML""#,
);

/// Counts reported after a complete XGMML export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct XgmmlSummary {
    pub node_count: usize,
    pub edge_count: usize,
    pub term_count: usize,
}

/// Escape a string for use inside a double-quoted XML attribute.
///
/// Characters XML 1.0 cannot carry at all (C0 controls other than tab,
/// newline and carriage return, U+FFFE, U+FFFF) become U+FFFD.
#[must_use]
pub fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            '\u{0}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}' => escaped.push('\u{fffd}'),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Shape and fill colour for a node, by function.
fn node_graphics(function: FunctionType) -> (&'static str, &'static str) {
    use FunctionType as F;
    match function {
        F::Abundance | F::ProteinAbundance | F::ComplexAbundance | F::CompositeAbundance => {
            ("ELLIPSE", "#99ccff")
        }
        F::GeneAbundance => ("RECTANGLE", "#ffff99"),
        F::RnaAbundance | F::MicroRnaAbundance => ("DIAMOND", "#ccffcc"),
        F::BiologicalProcess | F::Pathology => ("ROUND_RECTANGLE", "#ff9999"),
        F::CatalyticActivity
        | F::ChaperoneActivity
        | F::GtpBoundActivity
        | F::KinaseActivity
        | F::MolecularActivity
        | F::PeptidaseActivity
        | F::PhosphataseActivity
        | F::RibosylationActivity
        | F::TranscriptionalActivity
        | F::TransportActivity => ("HEXAGON", "#ffcc99"),
        F::ProteinModification | F::Substitution | F::Truncation => ("OCTAGON", "#cccccc"),
        F::CellSecretion
        | F::CellSurfaceExpression
        | F::Degradation
        | F::Reaction
        | F::Translocation => ("PARALLELOGRAM", "#cc99ff"),
        F::Unknown => ("ELLIPSE", "#ffffff"),
    }
}

/// Line colour for an edge, by relationship.
fn edge_fill(relationship: RelationshipType) -> &'static str {
    use RelationshipType as R;
    match relationship {
        R::Increases | R::DirectlyIncreases => "#009900",
        R::Decreases | R::DirectlyDecreases => "#cc0000",
        r if r.is_causal() => "#000099",
        r if r.is_correlative() => "#999999",
        _ => "#000000",
    }
}

/// `fn(label)`, the BEL-style rendering of an endpoint in edge labels.
fn endpoint_label(node: &ResolvedNode) -> String {
    format!("{}({})", node.function.abbreviation(), node.label)
}

/// Low-level XGMML element writer.
///
/// Knows nothing about stores or dialects; callers hand it resolved values.
#[derive(Debug)]
pub struct XgmmlWriter<W: Write> {
    out: W,
}

impl<W: Write> XgmmlWriter<W> {
    /// Wrap an output stream.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Write the XML declaration and the opening `<graph>` element.
    pub fn write_start(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.out, "{}", XML_DECLARATION)?;
        writeln!(
            self.out,
            r#"<graph label="{}" {} directed="1">"#,
            escape_attr(title),
            GRAPH_NAMESPACES
        )
    }

    /// Write one `<node>` with its supporting terms, in the given order.
    pub fn write_node(&mut self, node: &ResolvedNode, terms: &[BelTerm]) -> io::Result<()> {
        let label = escape_attr(&node.label);
        writeln!(self.out, r#"  <node label="{}" id="{}">"#, label, node.id)?;
        writeln!(
            self.out,
            r#"    <att type="string" name="function type" value="{}"/>"#,
            node.function.display_name()
        )?;
        writeln!(self.out, r#"    <att type="list" name="supporting terms">"#)?;
        for term in terms {
            writeln!(
                self.out,
                r#"      <att type="string" name="term" value="{}"/>"#,
                escape_attr(term.as_str())
            )?;
        }
        writeln!(self.out, "    </att>")?;

        let (shape, fill) = node_graphics(node.function);
        let width = (node.label.chars().count() as u64)
            .saturating_mul(8)
            .saturating_add(20);
        writeln!(
            self.out,
            r##"    <graphics type="{}" h="30" w="{}" fill="{}" outline="#000000" width="1"/>"##,
            shape, width, fill
        )?;
        writeln!(self.out, "  </node>")
    }

    /// Write one `<edge>` with resolved endpoint descriptors.
    pub fn write_edge(
        &mut self,
        edge: &ResolvedEdge,
        source: &ResolvedNode,
        target: &ResolvedNode,
    ) -> io::Result<()> {
        let label = format!(
            "{} ({}) {}",
            endpoint_label(source),
            edge.relationship.display_name(),
            endpoint_label(target)
        );
        writeln!(
            self.out,
            r#"  <edge label="{}" source="{}" target="{}" id="{}">"#,
            escape_attr(&label),
            edge.source,
            edge.target,
            edge.id
        )?;
        writeln!(
            self.out,
            r#"    <att type="string" name="relationship type" value="{}"/>"#,
            edge.relationship.display_name()
        )?;
        writeln!(
            self.out,
            r#"    <graphics width="2" fill="{}" cy:targetArrow="3"/>"#,
            edge_fill(edge.relationship)
        )?;
        writeln!(self.out, "  </edge>")
    }

    /// Close the `<graph>` element.
    pub fn write_end(&mut self) -> io::Result<()> {
        writeln!(self.out, "</graph>")
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

fn io_err(e: io::Error) -> KamError {
    KamError::IoError(e.to_string())
}

/// Stream the KAM seen through `chain` as XGMML into `out`.
///
/// Two passes over the KAM: all nodes, then all edges. Each edge re-resolves
/// its endpoints through the chain rather than reusing node-pass values. An
/// edge endpoint that is not a node of the KAM aborts with
/// `KamError::DanglingEdge`.
pub fn write_xgmml<S, T, W>(
    chain: &DialectChain<'_, S>,
    support: &T,
    out: W,
) -> Result<XgmmlSummary, KamError>
where
    S: KamStore,
    T: TermSupport + ?Sized,
    W: Write,
{
    let kam = chain.kam();
    let mut writer = XgmmlWriter::new(out);
    let mut summary = XgmmlSummary::default();

    writer
        .write_start(&format!("{}{}", XGMML_TITLE_PREFIX, kam.name()))
        .map_err(io_err)?;

    for node in kam.nodes() {
        let resolved = chain.resolve_node(node.id)?;
        let terms = support.supporting_terms(kam.info(), node.id)?;
        writer.write_node(&resolved, &terms).map_err(io_err)?;
        summary.node_count += 1;
        summary.term_count += terms.len();
    }

    for edge in kam.edges() {
        let resolved = chain.resolve_edge(edge.id)?;
        let endpoint = |id: NodeId| match chain.resolve_node(id) {
            Err(KamError::NodeNotFound(node)) => Err(KamError::DanglingEdge {
                edge: resolved.id,
                node,
            }),
            other => other,
        };
        let source = endpoint(resolved.source)?;
        let target = endpoint(resolved.target)?;
        writer
            .write_edge(&resolved, &source, &target)
            .map_err(io_err)?;
        summary.edge_count += 1;
    }

    writer.write_end().map_err(io_err)?;
    writer.flush().map_err(io_err)?;
    Ok(summary)
}

/// Export to an XGMML file at `path`.
///
/// The output is flushed on every exit path. On failure the partially
/// written file is left in place for the caller to report.
pub fn export_xgmml_file<S, T>(
    chain: &DialectChain<'_, S>,
    support: &T,
    path: &Path,
) -> Result<XgmmlSummary, KamError>
where
    S: KamStore,
    T: TermSupport + ?Sized,
{
    let file = File::create(path).map_err(|e| {
        KamError::IoError(format!("Cannot create '{}': {}", path.display(), e))
    })?;
    let mut out = BufWriter::new(file);

    let result = write_xgmml(chain, support, &mut out);
    let flushed = out.flush().map_err(io_err);

    let summary = result?;
    flushed?;
    Ok(summary)
}

// =============================================================================
// TESTS
// =============================================================================

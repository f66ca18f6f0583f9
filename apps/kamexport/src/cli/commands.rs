//! # CLI Command Implementations
//!
//! Every command takes its environment lookup as a closure and reports
//! through `tracing` and stdout; the core below never prints.

use super::ExportSelection;
use crate::config::SystemConfiguration;
use kamexport_core::formats::snapshot::{looks_like_snapshot, snapshot_digest};
use kamexport_core::primitives::MAX_SNAPSHOT_SIZE;
use kamexport_core::{
    ExportOutcome, ExportRequest, ExportType, KamDocument, KamError, KamStore, RedbKamStore,
    export_loaded, load_kam, read_snapshot,
};
use std::path::{Path, PathBuf};

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), KamError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        KamError::IoError(format!("Cannot read file '{}': {}", path.display(), e))
    })?;

    if metadata.len() > max_size {
        return Err(KamError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

fn open_store(config: &SystemConfiguration) -> Result<RedbKamStore, KamError> {
    let path = config.database_path()?;
    tracing::info!(
        url = %config.store.url,
        user = %config.store.user,
        "Using KAM store"
    );
    let store = RedbKamStore::open(&path)?;
    tracing::info!(path = %path.display(), "Accessed KAM store");
    Ok(store)
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Export one KAM into `out_dir`.
///
/// The selection is validated before configuration is resolved or the
/// store is opened. On success prints `Saved file '<absolute path>'`.
pub fn cmd_export<F>(
    selection: &ExportSelection,
    env: F,
    out_dir: &Path,
) -> Result<ExportOutcome, KamError>
where
    F: Fn(&str) -> Option<String>,
{
    let request = ExportRequest::from_selection(
        selection.kam.as_deref(),
        selection.taxid.as_deref(),
        selection.export_type.as_deref(),
    )?;

    let config = SystemConfiguration::resolve(env)?;
    let store = open_store(&config)?;

    let kam = load_kam(&store, &request.kam_name)?;
    match request.export_type {
        ExportType::Xgmml => tracing::info!(
            "Loaded KAM '{}' and orthologized to species {}",
            kam.name(),
            request.taxonomy
        ),
        ExportType::Snapshot => tracing::info!("Loaded KAM '{}'", kam.name()),
    }

    let target = out_dir.join(request.file_name());
    tracing::info!(
        "Exporting KAM '{}' to file '{}'",
        kam.name(),
        target.display()
    );
    let mut outcome = export_loaded(&store, &kam, &request, out_dir)?;
    tracing::debug!(
        nodes = outcome.node_count,
        edges = outcome.edge_count,
        "Export complete"
    );

    if outcome.export_type == ExportType::Snapshot {
        let digest = snapshot_digest(&outcome.path)?;
        tracing::info!(blake3 = %digest, "Snapshot digest");
    }

    if let Ok(absolute) = outcome.path.canonicalize() {
        outcome.path = absolute;
    }
    println!("Saved file '{}'", outcome.path.display());
    Ok(outcome)
}

// =============================================================================
// LOAD COMMAND
// =============================================================================

/// Read a KAM document from JSON or a PKAM snapshot.
pub fn read_document(file: &Path) -> Result<KamDocument, KamError> {
    validate_file_size(file, MAX_SNAPSHOT_SIZE)?;
    let data = std::fs::read(file).map_err(|e| {
        KamError::IoError(format!("Cannot read file '{}': {}", file.display(), e))
    })?;

    if looks_like_snapshot(&data) {
        tracing::debug!(file = %file.display(), "Reading PKAM snapshot");
        let (_, document) = read_snapshot(&data)?;
        Ok(document)
    } else {
        tracing::debug!(file = %file.display(), "Reading JSON KAM document");
        serde_json::from_slice(&data)
            .map_err(|e| KamError::SerializationError(format!("Invalid KAM document: {}", e)))
    }
}

/// Load a KAM document into the configured store, creating it if needed.
pub fn cmd_load<F>(file: &Path, env: F) -> Result<PathBuf, KamError>
where
    F: Fn(&str) -> Option<String>,
{
    let document = read_document(file)?;
    let config = SystemConfiguration::resolve(env)?;
    let path = config.database_path()?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| KamError::IoError(e.to_string()))?;
    }
    let mut store = RedbKamStore::create(&path)?;
    store.put_document(&document)?;

    tracing::info!(kam = %document.name, store = %path.display(), "Stored KAM");
    println!(
        "Loaded KAM '{}' ({} nodes, {} edges)",
        document.name,
        document.nodes.len(),
        document.edges.len()
    );
    Ok(path)
}

// =============================================================================
// LIST COMMAND
// =============================================================================

/// Print the names of all stored KAMs.
pub fn cmd_list<F>(env: F, json: bool) -> Result<Vec<String>, KamError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = SystemConfiguration::resolve(env)?;
    let store = open_store(&config)?;
    let names = store.kam_names()?;

    if json {
        let output = serde_json::json!({ "kams": names });
        println!(
            "{}",
            serde_json::to_string_pretty(&output)
                .map_err(|e| KamError::SerializationError(e.to_string()))?
        );
    } else if names.is_empty() {
        println!("No KAMs stored.");
    } else {
        for name in &names {
            println!("{}", name);
        }
    }
    Ok(names)
}

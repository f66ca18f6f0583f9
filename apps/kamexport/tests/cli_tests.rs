//! Orchestration tests for the kamexport commands.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use clap::Parser;
use kamexport::cli::{Cli, Commands, ExportSelection, cmd_export, cmd_list, cmd_load};
use kamexport::config::{CONFIG_FILE, SystemConfiguration};
use kamexport_core::formats::document::{DocumentNode, OrthologEntry};
use kamexport_core::{
    EdgeId, ExportType, FunctionType, KamDocument, KamEdge, KamError, NodeId, RedbKamStore,
    RelationshipType, TaxonomyId, write_snapshot,
};
use std::cell::RefCell;
use std::path::Path;
use tempfile::tempdir;

fn demo_document() -> KamDocument {
    let mut doc = KamDocument::new("demo");
    doc.nodes.push(DocumentNode::new(
        NodeId(1),
        FunctionType::KinaseActivity,
        "geneA",
    ));
    doc.nodes.push(DocumentNode::new(
        NodeId(2),
        FunctionType::ProteinAbundance,
        "geneB",
    ));
    doc.edges.push(KamEdge::new(
        EdgeId(10),
        RelationshipType::Increases,
        NodeId(1),
        NodeId(2),
    ));
    doc.orthologs.push(OrthologEntry {
        node: NodeId(1),
        taxonomy: TaxonomyId(9606),
        function: FunctionType::KinaseActivity,
        label: "GENEA_human".to_string(),
    });
    doc
}

/// Write a configuration root whose store lives at `<root>/data/kams.redb`.
fn write_config(root: &Path) {
    std::fs::create_dir_all(root.join("config")).unwrap();
    std::fs::write(
        root.join(CONFIG_FILE),
        "[kam_store]\nurl = \"redb://data/kams.redb\"\nuser = \"kam\"\npassword = \"secret\"\n",
    )
    .unwrap();
}

fn seeded_root(root: &Path) {
    write_config(root);
    std::fs::create_dir_all(root.join("data")).unwrap();
    let mut store = RedbKamStore::create(root.join("data/kams.redb")).unwrap();
    store.put_document(&demo_document()).unwrap();
}

fn selection(kam: &str, taxid: &str, export_type: &str) -> ExportSelection {
    ExportSelection {
        kam: Some(kam.to_string()),
        taxid: Some(taxid.to_string()),
        export_type: Some(export_type.to_string()),
    }
}

fn home(root: &Path) -> impl Fn(&str) -> Option<String> + '_ {
    move |key: &str| (key == "KAMEXPORT_HOME").then(|| root.display().to_string())
}

// =============================================================================
// ARGUMENT PARSING
// =============================================================================

#[test]
fn test_flat_export_flags_parse() {
    let cli =
        Cli::try_parse_from(["kamexport", "-k", "demo", "-s", "9606", "-t", "xgmml"]).unwrap();
    assert_eq!(cli.selection.kam.as_deref(), Some("demo"));
    assert_eq!(cli.selection.taxid.as_deref(), Some("9606"));
    assert_eq!(cli.selection.export_type.as_deref(), Some("xgmml"));
    assert!(cli.command.is_none());
}

#[test]
fn test_non_numeric_taxid_still_parses() {
    let cli = Cli::try_parse_from(["kamexport", "--kam", "demo", "--taxid", "abc", "--type", "KAM"])
        .unwrap();
    assert_eq!(cli.selection.taxid.as_deref(), Some("abc"));
}

#[test]
fn test_subcommands_parse() {
    let cli = Cli::try_parse_from(["kamexport", "load", "-f", "demo.json"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Load { .. })));

    let cli = Cli::try_parse_from(["kamexport", "-v", "list", "--json"]).unwrap();
    assert!(cli.verbose);
    assert!(matches!(cli.command, Some(Commands::List { json: true })));
}

#[test]
fn test_global_flags_before_subcommand() {
    let cli = Cli::try_parse_from(["kamexport", "-v", "list"]).unwrap();
    assert!(cli.verbose);
    assert!(matches!(cli.command, Some(Commands::List { json: false })));

    let cli = Cli::try_parse_from(["kamexport", "--debug", "load", "-f", "x.json"]).unwrap();
    assert!(cli.debug);
    assert!(matches!(cli.command, Some(Commands::Load { .. })));

    let cli = Cli::try_parse_from(["kamexport", "list", "-v"]).unwrap();
    assert!(cli.verbose);
}

// =============================================================================
// VALIDATION BEFORE STORE ACCESS
// =============================================================================

#[test]
fn test_unsupported_type_fails_before_env_lookup() {
    let temp = tempdir().unwrap();
    let seen = RefCell::new(Vec::new());
    let env = |key: &str| {
        seen.borrow_mut().push(key.to_string());
        None::<String>
    };

    let err = cmd_export(&selection("demo", "9606", "CSV"), env, temp.path()).unwrap_err();
    assert!(err.is_usage_error());
    assert!(seen.borrow().is_empty());
}

#[test]
fn test_non_numeric_taxid_fails_before_env_lookup() {
    let temp = tempdir().unwrap();
    let seen = RefCell::new(Vec::new());
    let env = |key: &str| {
        seen.borrow_mut().push(key.to_string());
        None::<String>
    };

    let err = cmd_export(&selection("demo", "abc", "XGMML"), env, temp.path()).unwrap_err();
    assert_eq!(err.to_string(), "The species taxonomy id is not a number.");
    assert!(seen.borrow().is_empty());
}

#[test]
fn test_missing_kam_name_reported() {
    let temp = tempdir().unwrap();
    let partial = ExportSelection {
        kam: None,
        ..selection("demo", "9606", "XGMML")
    };
    let err = cmd_export(&partial, |_| None, temp.path()).unwrap_err();
    assert_eq!(err.to_string(), "The KAM name was not provided.");
}

// =============================================================================
// CONFIGURATION
// =============================================================================

#[test]
fn test_fallback_home_used() {
    let temp = tempdir().unwrap();
    write_config(temp.path());
    let root = temp.path().display().to_string();

    let config =
        SystemConfiguration::resolve(|key| (key == "CMD_HOME").then(|| root.clone())).unwrap();
    assert_eq!(config.store.user, "kam");
    assert_eq!(
        config.database_path().unwrap(),
        temp.path().join("data/kams.redb")
    );
}

#[test]
fn test_primary_home_wins() {
    let primary = tempdir().unwrap();
    let fallback = tempdir().unwrap();
    write_config(primary.path());
    let (a, b) = (
        primary.path().display().to_string(),
        fallback.path().display().to_string(),
    );

    let config = SystemConfiguration::resolve(|key| match key {
        "KAMEXPORT_HOME" => Some(a.clone()),
        "CMD_HOME" => Some(b.clone()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config.root, primary.path());
}

#[test]
fn test_missing_config_file_is_configuration_error() {
    let temp = tempdir().unwrap();
    let err = SystemConfiguration::load(temp.path()).unwrap_err();
    assert!(matches!(err, KamError::ConfigurationError(_)));
}

#[test]
fn test_valid_selection_without_home_is_configuration_error() {
    let temp = tempdir().unwrap();
    let err = cmd_export(&selection("demo", "9606", "XGMML"), |_| None, temp.path()).unwrap_err();
    assert!(matches!(err, KamError::ConfigurationError(_)));
    assert!(!err.is_usage_error());
}

// =============================================================================
// END TO END
// =============================================================================

#[test]
fn test_export_xgmml_end_to_end() {
    let root = tempdir().unwrap();
    let out = tempdir().unwrap();
    seeded_root(root.path());

    let request = selection("demo", "9606", "xgmml");
    let outcome = cmd_export(&request, home(root.path()), out.path()).unwrap();
    assert_eq!(outcome.export_type, ExportType::Xgmml);
    assert!(outcome.path.is_absolute());
    assert!(outcome.path.ends_with("demo.xgmml"));

    let xml = std::fs::read_to_string(&outcome.path).unwrap();
    assert!(xml.contains(r#"<node label="GENEA_human" id="1">"#));
    assert!(xml.contains(r#"<node label="geneB" id="2">"#));
}

#[test]
fn test_export_snapshot_end_to_end() {
    let root = tempdir().unwrap();
    let out = tempdir().unwrap();
    seeded_root(root.path());

    let request = selection("demo", "9606", "kam");
    let outcome = cmd_export(&request, home(root.path()), out.path()).unwrap();
    assert!(outcome.path.ends_with("demo.kam"));
    assert_eq!((outcome.node_count, outcome.edge_count), (2, 1));
}

#[test]
fn test_unknown_kam_not_found() {
    let root = tempdir().unwrap();
    let out = tempdir().unwrap();
    seeded_root(root.path());

    let request = selection("other", "9606", "XGMML");
    let err = cmd_export(&request, home(root.path()), out.path()).unwrap_err();
    assert_eq!(err.to_string(), "The specified KAM 'other' cannot be found.");
    assert!(!out.path().join("other.xgmml").exists());
}

#[test]
fn test_load_json_then_list() {
    let root = tempdir().unwrap();
    write_config(root.path());
    let file = root.path().join("demo.json");
    std::fs::write(&file, serde_json::to_vec(&demo_document()).unwrap()).unwrap();

    let db = cmd_load(&file, home(root.path())).unwrap();
    assert_eq!(db, root.path().join("data/kams.redb"));
    assert_eq!(cmd_list(home(root.path()), true).unwrap(), vec!["demo".to_string()]);
}

#[test]
fn test_load_snapshot() {
    let root = tempdir().unwrap();
    write_config(root.path());
    let file = root.path().join("demo.kam");
    let mut bytes = Vec::new();
    write_snapshot(&demo_document(), &mut bytes).unwrap();
    std::fs::write(&file, bytes).unwrap();

    cmd_load(&file, home(root.path())).unwrap();
    assert_eq!(cmd_list(home(root.path()), false).unwrap(), vec!["demo".to_string()]);
}

#[test]
fn test_load_rejects_garbage() {
    let root = tempdir().unwrap();
    write_config(root.path());
    let file = root.path().join("garbage.json");
    std::fs::write(&file, b"not a kam").unwrap();

    let err = cmd_load(&file, home(root.path())).unwrap_err();
    assert!(matches!(err, KamError::SerializationError(_)));
}

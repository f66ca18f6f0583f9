//! # kamexport CLI Module
//!
//! ## Usage
//!
//! ```bash
//! # Export an orthologized KAM as XGMML
//! kamexport -k demo -s 9606 -t XGMML
//!
//! # Export the canonical KAM as a PKAM snapshot
//! kamexport -k demo -s 9606 -t KAM
//!
//! # Store maintenance
//! kamexport load -f demo.json
//! kamexport list
//! ```

mod commands;

use clap::{Args, Parser, Subcommand};
use kamexport_core::KamError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Exports a KAM, orthologized for one species, as XGMML or a PKAM snapshot.
#[derive(Parser, Debug)]
#[command(name = "kamexport")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(flatten)]
    pub selection: ExportSelection,

    /// Store maintenance command; omit to export
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Raw export selection, validated by the core before anything else runs.
#[derive(Args, Debug, Clone, Default)]
pub struct ExportSelection {
    /// Name of the KAM to export
    #[arg(short = 'k', long = "kam")]
    pub kam: Option<String>,

    /// NCBI taxonomy id of the target species
    #[arg(short = 's', long = "taxid")]
    pub taxid: Option<String>,

    /// Export type: XGMML or KAM (case-insensitive)
    #[arg(short = 't', long = "type")]
    pub export_type: Option<String>,
}

/// Store maintenance commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a KAM document (JSON) or PKAM snapshot into the store
    Load {
        /// Path to the input file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List the KAMs in the store
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), KamError> {
    match cli.command {
        Some(Commands::Load { file }) => cmd_load(&file, process_env).map(|_| ()),
        Some(Commands::List { json }) => cmd_list(process_env, json).map(|_| ()),
        None => {
            let out_dir = std::env::current_dir().map_err(|e| {
                KamError::IoError(format!("Cannot determine working directory: {}", e))
            })?;
            cmd_export(&cli.selection, process_env, &out_dir).map(|_| ())
        }
    }
}

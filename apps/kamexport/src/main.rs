//! # kamexport
//!
//! Exports a Knowledge Assembly Model, orthologized for one species, as
//! XGMML or as a PKAM snapshot.
//!
//! ## Usage
//!
//! ```bash
//! kamexport -k demo -s 9606 -t XGMML
//! kamexport -v -k demo -s 10090 -t kam
//! ```
//!
//! Exit status is 0 on success and 1 on any failure.

use clap::{CommandFactory, Parser};
use kamexport::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn default_directive(cli: &cli::Cli) -> &'static str {
    if cli.debug {
        "kamexport=debug"
    } else if cli.verbose {
        "kamexport=info"
    } else {
        "kamexport=warn"
    }
}

fn main() {
    let cli = cli::Cli::parse();

    // KAMEXPORT_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("KAMEXPORT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive(&cli).into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = cli::execute(cli) {
        let mut command = cli::Cli::command();
        if e.is_usage_error() {
            eprintln!("{}", command.render_help());
        } else {
            eprintln!("{}", command.render_usage());
        }
        eprintln!("Error: {}", e);
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

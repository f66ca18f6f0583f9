//! # kamexport
//!
//! Command-line orchestration around `kamexport-core`: argument parsing,
//! configuration, logging and user-facing reporting.

pub mod cli;
pub mod config;

//! # Formats Module
//!
//! Interchange and export formats:
//! - `document`: serde interchange form of one stored KAM
//! - `xgmml`: streaming XGMML graph markup
//! - `snapshot`: PKAM binary snapshots

pub mod document;
pub mod snapshot;
pub mod xgmml;

//! Export module for pocket-ledger
//!
//! Whole-store export to a JSON file and merge-import back from one.

pub mod json;

pub use json::{default_export_path, export_to_file, import_from_file, ExportSummary};

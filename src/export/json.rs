//! JSON export and import files
//!
//! An export file is the store's own export document: one JSON object whose
//! fields are exactly the store keys. Importing merges it back in, overwriting
//! keys that already exist.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::LedgerPaths;
use crate::error::{LedgerError, LedgerResult};
use crate::storage::{write_string_atomic, KeyValueStore};

/// What an export wrote
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub entries: usize,
    pub exported_at: DateTime<Utc>,
}

/// Timestamped file name inside the export directory
pub fn default_export_path(paths: &LedgerPaths, now: DateTime<Utc>) -> PathBuf {
    paths
        .export_dir()
        .join(format!("pocket-ledger-{}.json", now.format("%Y%m%d-%H%M%S")))
}

/// Write the whole store to `path` atomically
pub async fn export_to_file(store: &KeyValueStore, path: &Path) -> LedgerResult<ExportSummary> {
    let document = store.export_document().await?;
    let entries = document.len();
    let contents = serde_json::to_string_pretty(&serde_json::Value::Object(document))
        .map_err(|e| LedgerError::Export(e.to_string()))?;
    write_string_atomic(path, &contents)
        .map_err(|e| LedgerError::Export(format!("{}: {}", path.display(), e)))?;

    info!(path = %path.display(), entries, "exported store to file");
    Ok(ExportSummary {
        path: path.to_path_buf(),
        entries,
        exported_at: Utc::now(),
    })
}

/// Merge an export file into the store; returns how many entries it held
///
/// A file that is not a JSON object changes nothing.
pub async fn import_from_file(store: &KeyValueStore, path: &Path) -> LedgerResult<usize> {
    let blob = fs::read_to_string(path)
        .map_err(|e| LedgerError::Import(format!("Failed to read {}: {}", path.display(), e)))?;

    let entries = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&blob)
        .map(|document| document.len())
        .map_err(|e| {
            LedgerError::Import(format!("{} is not an export document: {}", path.display(), e))
        })?;

    if !store.import_all(&blob).await {
        return Err(LedgerError::Import(format!(
            "Some entries from {} could not be written",
            path.display()
        )));
    }

    info!(path = %path.display(), entries, "imported store from file");
    Ok(entries)
}

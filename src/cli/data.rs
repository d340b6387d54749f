//! Data CLI commands: whole-store export, import and reset

use std::path::PathBuf;

use chrono::Utc;
use clap::Subcommand;
use serde_json::json;

use super::print_json;
use crate::config::LedgerPaths;
use crate::error::{LedgerError, LedgerResult};
use crate::export::{default_export_path, export_to_file, import_from_file};
use crate::storage::Storage;

/// Data subcommands
#[derive(Subcommand)]
pub enum DataCommands {
    /// Export every stored entry to a JSON file
    Export {
        /// Output file, defaults to a timestamped file in the export directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge an export file into the store
    Import { file: PathBuf },

    /// Delete everything and restore the default categories
    Clear {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

/// Handle a data command
pub async fn handle_data_command(
    storage: &Storage,
    paths: &LedgerPaths,
    cmd: DataCommands,
) -> LedgerResult<()> {
    match cmd {
        DataCommands::Export { output } => {
            let path = output.unwrap_or_else(|| default_export_path(paths, Utc::now()));
            print_json(&export_to_file(storage.store(), &path).await?)
        }

        DataCommands::Import { file } => {
            let entries = import_from_file(storage.store(), &file).await?;
            print_json(&json!({ "imported": entries, "file": file }))
        }

        DataCommands::Clear { yes } => {
            if !yes {
                return Err(LedgerError::Validation(
                    "Refusing to delete all data without --yes".into(),
                ));
            }
            storage.reset().await?;
            print_json(&json!({ "cleared": true }))
        }
    }
}

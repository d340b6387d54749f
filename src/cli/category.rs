//! Category CLI commands
//!
//! Works on the expense category list, or on the income source list with
//! `--income`.

use clap::Subcommand;

use super::print_json;
use crate::error::LedgerResult;
use crate::services::CategoryService;
use crate::storage::Storage;

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List categories
    List {
        /// Use the income source list
        #[arg(long)]
        income: bool,
    },

    /// Add a category
    Add {
        name: String,
        /// Icon name
        #[arg(short, long, default_value = "pricetag")]
        icon: String,
        /// Hex color
        #[arg(short, long, default_value = "#95A5A6")]
        color: String,
        /// Use the income source list
        #[arg(long)]
        income: bool,
    },

    /// Remove a category by id or name
    Remove {
        category: String,
        /// Use the income source list
        #[arg(long)]
        income: bool,
    },
}

fn service(storage: &Storage, income: bool) -> CategoryService<'_> {
    if income {
        CategoryService::income_sources(storage)
    } else {
        CategoryService::expense_categories(storage)
    }
}

/// Handle a category command
pub async fn handle_category_command(storage: &Storage, cmd: CategoryCommands) -> LedgerResult<()> {
    match cmd {
        CategoryCommands::List { income } => print_json(&service(storage, income).list().await),
        CategoryCommands::Add {
            name,
            icon,
            color,
            income,
        } => print_json(&service(storage, income).add(&name, &icon, &color).await?),
        CategoryCommands::Remove { category, income } => {
            print_json(&service(storage, income).remove(&category).await?)
        }
    }
}

//! Expense CLI commands

use clap::Subcommand;
use serde_json::json;

use super::{parse_date, parse_money, parse_month, print_json};
use crate::error::LedgerResult;
use crate::models::{ExpenseDraft, ExpensePatch};
use crate::services::ExpenseService;
use crate::storage::Storage;

/// Expense subcommands
#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record an expense
    Add {
        /// Amount (e.g., "12.50")
        amount: String,
        /// Category name
        category: String,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Free-text note
        #[arg(short, long)]
        note: Option<String>,
    },

    /// List expenses, newest first
    List {
        /// Only this category
        #[arg(short, long)]
        category: Option<String>,
        /// Only this month (YYYY-MM)
        #[arg(short, long, conflicts_with_all = ["year", "from", "to"])]
        month: Option<String>,
        /// Only this year
        #[arg(short, long, conflicts_with_all = ["from", "to"])]
        year: Option<i32>,
        /// Start of an inclusive date range (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// End of an inclusive date range (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Maximum number of expenses to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show one expense
    Show { id: String },

    /// Change fields of an expense
    Update {
        id: String,
        #[arg(short, long)]
        amount: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short, long, conflicts_with = "clear_note")]
        note: Option<String>,
        /// Remove the note
        #[arg(long)]
        clear_note: bool,
    },

    /// Delete an expense
    Delete { id: String },

    /// Delete every expense
    Clear,

    /// Totals per category
    Totals {
        /// Only this month (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Categories with the largest totals
    Top {
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,
        /// Only this month (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,
    },
}

/// Handle an expense command
pub async fn handle_expense_command(storage: &Storage, cmd: ExpenseCommands) -> LedgerResult<()> {
    let service = ExpenseService::expenses(storage);

    match cmd {
        ExpenseCommands::Add {
            amount,
            category,
            date,
            note,
        } => {
            let mut draft =
                ExpenseDraft::new(parse_money(&amount)?, category, parse_date(date.as_deref())?);
            if let Some(note) = note {
                draft = draft.with_note(note);
            }
            print_json(&service.create(draft).await?)
        }

        ExpenseCommands::List {
            category,
            month,
            year,
            from,
            to,
            limit,
        } => {
            let mut expenses = match (month, year, from, to) {
                (Some(month), _, _, _) => {
                    let (month0, year) = parse_month(&month)?;
                    service.in_month(month0, year).await
                }
                (None, Some(year), _, _) => service.in_year(year).await,
                (None, None, Some(from), Some(to)) => {
                    service
                        .between(parse_date(Some(&from))?, parse_date(Some(&to))?)
                        .await?
                }
                _ => service.list().await,
            };
            if let Some(category) = category {
                expenses.retain(|e| e.category == category);
            }
            if let Some(limit) = limit {
                expenses.truncate(limit);
            }
            print_json(&expenses)
        }

        ExpenseCommands::Show { id } => print_json(&service.get(&id).await?),

        ExpenseCommands::Update {
            id,
            amount,
            category,
            date,
            note,
            clear_note,
        } => {
            let patch = ExpensePatch {
                amount: amount.as_deref().map(parse_money).transpose()?,
                category,
                date: date.as_deref().map(|d| parse_date(Some(d))).transpose()?,
                note: if clear_note { Some(None) } else { note.map(Some) },
            };
            print_json(&service.update(&id, patch).await?)
        }

        ExpenseCommands::Delete { id } => {
            let deleted = service.delete(&id).await?;
            print_json(&json!({ "id": id, "deleted": deleted }))
        }

        ExpenseCommands::Clear => {
            let removed = service.clear().await?;
            print_json(&json!({ "removed": removed }))
        }

        ExpenseCommands::Totals { month } => {
            let month = month.as_deref().map(parse_month).transpose()?;
            let totals = service.totals_by_label(month).await;
            let total: crate::models::Money = totals.values().copied().sum();
            print_json(&json!({ "total": total, "by_category": totals }))
        }

        ExpenseCommands::Top { count, month } => {
            let month = month.as_deref().map(parse_month).transpose()?;
            let top: Vec<_> = service
                .top_labels(count, month)
                .await
                .into_iter()
                .map(|(category, total)| json!({ "category": category, "total": total }))
                .collect();
            print_json(&top)
        }
    }
}

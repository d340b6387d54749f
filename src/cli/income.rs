//! Income CLI commands

use clap::Subcommand;
use serde_json::json;

use super::{parse_date, parse_money, parse_month, print_json};
use crate::error::LedgerResult;
use crate::models::{IncomeDraft, IncomePatch};
use crate::services::IncomeService;
use crate::storage::Storage;

/// Income subcommands
#[derive(Subcommand)]
pub enum IncomeCommands {
    /// Record an income
    Add {
        /// Amount (e.g., "12.50")
        amount: String,
        /// Source name
        source: String,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Free-text note
        #[arg(short, long)]
        note: Option<String>,
    },

    /// List incomes, newest first
    List {
        /// Only this source
        #[arg(short, long)]
        source: Option<String>,
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
        /// Maximum number of incomes to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show one income
    Show { id: String },

    /// Change fields of an income
    Update {
        id: String,
        #[arg(short, long)]
        amount: Option<String>,
        #[arg(short, long)]
        source: Option<String>,
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short, long, conflicts_with = "clear_note")]
        note: Option<String>,
        /// Remove the note
        #[arg(long)]
        clear_note: bool,
    },

    /// Delete an income
    Delete { id: String },

    /// Delete every income
    Clear,

    /// Totals per source
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

/// Handle an income command
pub async fn handle_income_command(storage: &Storage, cmd: IncomeCommands) -> LedgerResult<()> {
    let service = IncomeService::incomes(storage);

    match cmd {
        IncomeCommands::Add {
            amount,
            source,
            date,
            note,
        } => {
            let mut draft =
                IncomeDraft::new(parse_money(&amount)?, source, parse_date(date.as_deref())?);
            if let Some(note) = note {
                draft = draft.with_note(note);
            }
            print_json(&service.create(draft).await?)
        }

        IncomeCommands::List {
            source,
            month,
            year,
            from,
            to,
            limit,
        } => {
            let mut incomes = match (month, year, from, to) {
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
            if let Some(source) = source {
                incomes.retain(|e| e.source == source);
            }
            if let Some(limit) = limit {
                incomes.truncate(limit);
            }
            print_json(&incomes)
        }

        IncomeCommands::Show { id } => print_json(&service.get(&id).await?),

        IncomeCommands::Update {
            id,
            amount,
            source,
            date,
            note,
            clear_note,
        } => {
            let patch = IncomePatch {
                amount: amount.as_deref().map(parse_money).transpose()?,
                source,
                date: date.as_deref().map(|d| parse_date(Some(d))).transpose()?,
                note: if clear_note { Some(None) } else { note.map(Some) },
            };
            print_json(&service.update(&id, patch).await?)
        }

        IncomeCommands::Delete { id } => {
            let deleted = service.delete(&id).await?;
            print_json(&json!({ "id": id, "deleted": deleted }))
        }

        IncomeCommands::Clear => {
            let removed = service.clear().await?;
            print_json(&json!({ "removed": removed }))
        }

        IncomeCommands::Totals { month } => {
            let month = month.as_deref().map(parse_month).transpose()?;
            let totals = service.totals_by_label(month).await;
            let total: crate::models::Money = totals.values().copied().sum();
            print_json(&json!({ "total": total, "by_source": totals }))
        }

        IncomeCommands::Top { count, month } => {
            let month = month.as_deref().map(parse_month).transpose()?;
            let top: Vec<_> = service
                .top_labels(count, month)
                .await
                .into_iter()
                .map(|(source, total)| json!({ "source": source, "total": total }))
                .collect();
            print_json(&top)
        }
    }
}

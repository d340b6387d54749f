//! Budget CLI commands
//!
//! Budget records plus the aggregated views over them: per-budget summaries,
//! global totals, and the exceeded / near-limit lists.

use clap::Subcommand;
use serde_json::json;

use super::{current_month, parse_money, parse_month, print_json};
use crate::config::Settings;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{BudgetDraft, BudgetPatch, BudgetPeriod};
use crate::services::{BudgetAggregator, BudgetService};
use crate::storage::Storage;

/// Budget subcommands
#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Create a budget for a category
    Add {
        /// Category name
        category: String,
        /// Assigned amount (e.g., "500" or "500.00")
        amount: String,
        /// monthly, weekly or yearly
        #[arg(short, long, default_value = "monthly")]
        period: BudgetPeriod,
        /// Month for monthly budgets (YYYY-MM), defaults to the current month
        #[arg(short, long)]
        month: Option<String>,
        /// Year for yearly budgets, defaults to the current year
        #[arg(short, long)]
        year: Option<i32>,
        /// Warn once this percentage is used
        #[arg(short, long, default_value = "80")]
        threshold: f64,
        /// Never alert for this budget
        #[arg(long)]
        no_alert: bool,
    },

    /// List budgets
    List {
        /// Only this period kind
        #[arg(short, long)]
        period: Option<BudgetPeriod>,
    },

    /// Show a budget with its spend figures
    Show { id: String },

    /// Change fields of a budget
    Update {
        id: String,
        #[arg(short, long)]
        amount: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        threshold: Option<f64>,
        /// Turn alerts on or off
        #[arg(long)]
        alerts: Option<bool>,
    },

    /// Delete a budget
    Delete { id: String },

    /// Spend figures for every budget
    Summary,

    /// Totals across all budgets
    Stats,

    /// Budgets that are over their assigned amount
    Exceeded,

    /// Budgets close to, but not over, their assigned amount
    NearLimit {
        /// Percentage used that counts as near (defaults to the configured value)
        #[arg(short, long)]
        threshold: Option<f64>,
    },
}

fn draft_from_args(
    category: String,
    amount: &str,
    period: BudgetPeriod,
    month: Option<&str>,
    year: Option<i32>,
) -> LedgerResult<BudgetDraft> {
    let amount = parse_money(amount)?;
    let (current_month0, current_year) = current_month();

    let draft = match period {
        BudgetPeriod::Monthly => {
            let (month0, year) = match month {
                Some(month) => parse_month(month)?,
                None => (current_month0, year.unwrap_or(current_year)),
            };
            BudgetDraft::monthly(category, amount, month0, year)
        }
        BudgetPeriod::Yearly => {
            if month.is_some() {
                return Err(LedgerError::Validation(
                    "Yearly budgets do not take a month".into(),
                ));
            }
            BudgetDraft::yearly(category, amount, year.unwrap_or(current_year))
        }
        BudgetPeriod::Weekly => {
            let mut draft = BudgetDraft::yearly(category, amount, year.unwrap_or(current_year));
            draft.period = BudgetPeriod::Weekly;
            draft
        }
    };
    Ok(draft)
}

/// Handle a budget command
pub async fn handle_budget_command(
    storage: &Storage,
    settings: &Settings,
    cmd: BudgetCommands,
) -> LedgerResult<()> {
    let service = BudgetService::new(storage);
    let aggregator = BudgetAggregator::new(storage);

    match cmd {
        BudgetCommands::Add {
            category,
            amount,
            period,
            month,
            year,
            threshold,
            no_alert,
        } => {
            let draft = draft_from_args(category, &amount, period, month.as_deref(), year)?
                .with_alert(!no_alert, threshold);
            print_json(&service.create(draft).await?)
        }

        BudgetCommands::List { period } => {
            let budgets = match period {
                Some(period) => service.by_period(period).await,
                None => service.list().await,
            };
            print_json(&budgets)
        }

        BudgetCommands::Show { id } => {
            let budget = service.get(&id).await?;
            print_json(&aggregator.summarize(budget).await)
        }

        BudgetCommands::Update {
            id,
            amount,
            category,
            threshold,
            alerts,
        } => {
            let patch = BudgetPatch {
                assigned_amount: amount.as_deref().map(parse_money).transpose()?,
                category,
                alert_threshold_percent: threshold,
                alert_enabled: alerts,
                ..Default::default()
            };
            print_json(&service.update(&id, patch).await?)
        }

        BudgetCommands::Delete { id } => {
            let deleted = service.delete(&id).await?;
            print_json(&json!({ "id": id, "deleted": deleted }))
        }

        BudgetCommands::Summary => print_json(&aggregator.summarize_all().await),

        BudgetCommands::Stats => print_json(&aggregator.global_stats().await),

        BudgetCommands::Exceeded => print_json(&aggregator.exceeded().await),

        BudgetCommands::NearLimit { threshold } => {
            let threshold = threshold.unwrap_or(settings.near_limit_percent);
            print_json(&aggregator.near_limit(threshold).await)
        }
    }
}

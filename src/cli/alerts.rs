//! Budget alert CLI commands

use clap::Subcommand;

use super::notify::cli_scheduler;
use super::print_json;
use crate::config::Settings;
use crate::error::LedgerResult;
use crate::notify::BudgetMonitor;
use crate::services::AlertEvaluator;
use crate::storage::Storage;

/// Alert subcommands
#[derive(Subcommand)]
pub enum AlertsCommands {
    /// Evaluate budgets and deliver alerts
    Check,

    /// Evaluate budgets without delivering anything
    List,
}

/// Handle an alerts command
pub async fn handle_alerts_command(
    storage: &Storage,
    settings: &Settings,
    cmd: AlertsCommands,
) -> LedgerResult<()> {
    match cmd {
        AlertsCommands::Check => {
            let scheduler = cli_scheduler(settings);
            let outcome = BudgetMonitor::new(storage, &scheduler, settings.user_id.as_str())
                .check()
                .await;
            print_json(&outcome)
        }
        AlertsCommands::List => print_json(&AlertEvaluator::new(storage).evaluate().await),
    }
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;

use pocket_ledger::cli::{
    handle_alerts_command, handle_budget_command, handle_category_command, handle_data_command,
    handle_expense_command, handle_income_command, handle_notify_command, print_json,
};
use pocket_ledger::config::{LedgerPaths, Settings};
use pocket_ledger::services::PreferencesService;
use pocket_ledger::storage::Storage;

#[derive(Parser)]
#[command(
    name = "pocket",
    author = "Kaylee Beyene",
    version,
    about = "Track expenses, incomes and budgets from the command line",
    long_about = "pocket-ledger records expenses and incomes, tracks them against \
                  monthly and yearly budgets, and raises alerts when a budget \
                  nears or passes its limit. Every command prints JSON."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Expense management commands
    #[command(subcommand, alias = "exp")]
    Expense(pocket_ledger::cli::ExpenseCommands),

    /// Income management commands
    #[command(subcommand)]
    Income(pocket_ledger::cli::IncomeCommands),

    /// Budget management commands
    #[command(subcommand)]
    Budget(pocket_ledger::cli::BudgetCommands),

    /// Category and income source commands
    #[command(subcommand)]
    Category(pocket_ledger::cli::CategoryCommands),

    /// Budget alert commands
    #[command(subcommand)]
    Alerts(pocket_ledger::cli::AlertsCommands),

    /// Notification commands
    #[command(subcommand)]
    Notify(pocket_ledger::cli::NotifyCommands),

    /// Export, import and reset commands
    #[command(subcommand)]
    Data(pocket_ledger::cli::DataCommands),

    /// Initialize the data directory and default categories
    Init,

    /// Show current configuration and paths
    Config,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    // Initialize paths and settings
    let paths = LedgerPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    // Initialize storage
    let storage = Storage::open(&paths, &settings)?;
    storage.initialize().await?;

    match cli.command {
        Some(Commands::Expense(cmd)) => handle_expense_command(&storage, cmd).await?,
        Some(Commands::Income(cmd)) => handle_income_command(&storage, cmd).await?,
        Some(Commands::Budget(cmd)) => handle_budget_command(&storage, &settings, cmd).await?,
        Some(Commands::Category(cmd)) => handle_category_command(&storage, cmd).await?,
        Some(Commands::Alerts(cmd)) => handle_alerts_command(&storage, &settings, cmd).await?,
        Some(Commands::Notify(cmd)) => handle_notify_command(&storage, &settings, cmd).await?,
        Some(Commands::Data(cmd)) => handle_data_command(&storage, &paths, cmd).await?,
        Some(Commands::Init) => {
            settings.save(&paths)?;
            print_json(&json!({
                "initialized": true,
                "base_dir": paths.base_dir(),
                "store_file": paths.store_file(),
            }))?;
        }
        Some(Commands::Config) => {
            let preferences = PreferencesService::new(&storage, settings.user_id.as_str())
                .get()
                .await;
            print_json(&json!({
                "paths": {
                    "base_dir": paths.base_dir(),
                    "data_dir": paths.data_dir(),
                    "export_dir": paths.export_dir(),
                    "settings_file": paths.settings_file(),
                    "store_file": paths.store_file(),
                },
                "settings": settings,
                "preferences": preferences,
            }))?;
        }
        None => {
            println!("pocket-ledger - expense, income and budget tracking");
            println!();
            println!("Run 'pocket --help' for usage information.");
        }
    }

    Ok(())
}

//! pocket-ledger - personal expense, income and budget tracking
//!
//! Every record lives in one key-value store under a per-kind key prefix
//! (`expenses_`, `incomes_`, `budgets_`). Budget figures are derived from the
//! stored expenses at read time, classified into alerts, and handed to a
//! notification scheduler that talks to a pluggable sink.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Records, derived summaries and notification intents
//! - `storage`: Key-value store, backends and the generic record repository
//! - `events`: Change notifications published by repositories
//! - `services`: Queries, budget aggregation and alert evaluation
//! - `notify`: Notification sinks, the scheduler and the budget monitor
//! - `export`: Whole-store export and import files
//! - `cli`: Command handlers for the `pocket` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use pocket_ledger::models::{BudgetDraft, Money};
//! use pocket_ledger::services::BudgetAggregator;
//! use pocket_ledger::storage::Storage;
//!
//! let storage = Storage::in_memory();
//! storage.initialize().await?;
//! let budget = storage
//!     .budgets
//!     .create(BudgetDraft::monthly("Food", Money::from_cents(50000), 4, 2025))
//!     .await?;
//! let summary = BudgetAggregator::new(&storage).summarize(budget).await;
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod export;
pub mod models;
pub mod notify;
pub mod services;
pub mod storage;

pub use error::{LedgerError, LedgerResult};

//! Service layer for pocket-ledger
//!
//! The service layer provides business logic on top of the storage layer:
//! queries over expenses and incomes, budget aggregation, alert evaluation
//! and the definition lists and preferences kept beside the records.

pub mod alerts;
pub mod budget;
pub mod category;
pub mod entries;
pub mod preferences;

pub use alerts::AlertEvaluator;
pub use budget::{BudgetAggregator, BudgetService};
pub use category::CategoryService;
pub use entries::{EntryService, ExpenseService, IncomeService};
pub use preferences::PreferencesService;

//! Core data models for pocket-ledger
//!
//! Persisted records (expenses, incomes, budgets), the definitions and
//! preferences stored beside them, and the values derived from them
//! (budget summaries, alerts, notification intents).

pub mod alert;
pub mod budget;
pub mod category;
pub mod expense;
pub mod ids;
pub mod income;
pub mod money;
pub mod notification;
pub mod record;
pub mod user;

pub use alert::{Alert, AlertKind};
pub use budget::{
    Budget, BudgetDraft, BudgetPatch, BudgetPeriod, BudgetSummary, GlobalBudgetStats,
};
pub use category::{CategoryDefinition, CategoryList};
pub use expense::{Expense, ExpenseDraft, ExpensePatch};
pub use ids::generate_id;
pub use income::{Income, IncomeDraft, IncomePatch};
pub use money::Money;
pub use notification::{PermissionState, Recurrence, ScheduledNotification};
pub use record::{EntityType, LedgerEntry, Record};
pub use user::{NotificationPreferences, Theme, UserConfig};

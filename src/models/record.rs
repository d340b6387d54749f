//! The shape shared by every persisted record kind
//!
//! A record lives under `PREFIX + id` in the key-value store. The generic
//! repository only needs to know how to build one from a draft, how to merge a
//! partial update into it, and how to stamp its modification time.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::Money;
use crate::error::LedgerResult;

/// Kind of entity a record or event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Expense,
    Income,
    Budget,
    ExpenseCategory,
    IncomeSource,
    UserConfig,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "Expense",
            Self::Income => "Income",
            Self::Budget => "Budget",
            Self::ExpenseCategory => "ExpenseCategory",
            Self::IncomeSource => "IncomeSource",
            Self::UserConfig => "UserConfig",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A record stored under a key namespace
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Key namespace, including the trailing separator (e.g. `"expenses_"`)
    const PREFIX: &'static str;

    const ENTITY: EntityType;

    /// Fields supplied on creation (everything except id and timestamps)
    type Draft;

    /// Partial update; `None` fields are left unchanged
    type Patch;

    /// Build a new record with `created_at == updated_at == now`
    fn from_draft(id: String, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    fn id(&self) -> &str;

    fn created_at(&self) -> DateTime<Utc>;

    /// Merge a patch. Must not touch id or `created_at`.
    fn apply_patch(&mut self, patch: Self::Patch);

    /// Set `updated_at`
    fn touch(&mut self, now: DateTime<Utc>);

    /// Check field-level invariants before the record is written
    fn validate(&self) -> LedgerResult<()>;
}

/// A dated money movement grouped under a label (expense category or income
/// source)
pub trait LedgerEntry: Record {
    fn amount(&self) -> Money;

    /// Category for expenses, source for incomes
    fn label(&self) -> &str;

    fn date(&self) -> NaiveDate;

    /// Month index 0-11 and calendar year both match
    fn falls_in_month(&self, month0: u32, year: i32) -> bool {
        let date = self.date();
        date.month0() == month0 && date.year() == year
    }

    fn falls_in_year(&self, year: i32) -> bool {
        self.date().year() == year
    }
}

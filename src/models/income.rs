//! Income model
//!
//! One inflow of money on a calendar date, tagged with the source it came from.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::money::Money;
use super::record::{EntityType, LedgerEntry, Record};
use crate::error::{LedgerError, LedgerResult};

/// A single income entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    pub id: String,
    pub amount: Money,

    /// Source name (e.g. "Salary", "Freelance")
    pub source: String,

    pub date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new income entry
#[derive(Debug, Clone)]
pub struct IncomeDraft {
    pub amount: Money,
    pub source: String,
    pub date: NaiveDate,
    pub note: Option<String>,
}

impl IncomeDraft {
    pub fn new(amount: Money, source: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            amount,
            source: source.into(),
            date,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Partial update for an income entry
#[derive(Debug, Clone, Default)]
pub struct IncomePatch {
    pub amount: Option<Money>,
    pub source: Option<String>,
    pub date: Option<NaiveDate>,
    pub note: Option<Option<String>>,
}

impl Income {
    pub fn is_in_month(&self, month0: u32, year: i32) -> bool {
        self.date.month0() == month0 && self.date.year() == year
    }

    pub fn is_in_year(&self, year: i32) -> bool {
        self.date.year() == year
    }

    pub fn is_between(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.date >= start && self.date <= end
    }
}

impl LedgerEntry for Income {
    fn amount(&self) -> Money {
        self.amount
    }

    fn label(&self) -> &str {
        &self.source
    }

    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Record for Income {
    const PREFIX: &'static str = "incomes_";
    const ENTITY: EntityType = EntityType::Income;

    type Draft = IncomeDraft;
    type Patch = IncomePatch;

    fn from_draft(id: String, draft: IncomeDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            amount: draft.amount,
            source: draft.source,
            date: draft.date,
            note: draft.note,
            created_at: now,
            updated_at: now,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn apply_patch(&mut self, patch: IncomePatch) {
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(source) = patch.source {
            self.source = source;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(note) = patch.note {
            self.note = note;
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn validate(&self) -> LedgerResult<()> {
        if !self.amount.is_positive() {
            return Err(LedgerError::Validation(format!(
                "Income amount must be positive, got {}",
                self.amount
            )));
        }
        if self.source.trim().is_empty() {
            return Err(LedgerError::Validation("Income source cannot be empty".into()));
        }
        Ok(())
    }
}

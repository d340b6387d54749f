//! Expense model
//!
//! One outflow of money on a calendar date, tagged with a category name.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::money::Money;
use super::record::{EntityType, LedgerEntry, Record};
use crate::error::{LedgerError, LedgerResult};

/// A single expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,

    /// Amount spent (always positive)
    pub amount: Money,

    /// Category name, matched exactly against budget categories
    pub category: String,

    pub date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new expense
#[derive(Debug, Clone)]
pub struct ExpenseDraft {
    pub amount: Money,
    pub category: String,
    pub date: NaiveDate,
    pub note: Option<String>,
}

impl ExpenseDraft {
    pub fn new(amount: Money, category: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            amount,
            category: category.into(),
            date,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Partial update for an expense
///
/// `note: Some(None)` clears the note.
#[derive(Debug, Clone, Default)]
pub struct ExpensePatch {
    pub amount: Option<Money>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub note: Option<Option<String>>,
}

impl Expense {
    /// Check whether the expense falls in a month (0-11) of a year
    pub fn is_in_month(&self, month0: u32, year: i32) -> bool {
        self.date.month0() == month0 && self.date.year() == year
    }

    pub fn is_in_year(&self, year: i32) -> bool {
        self.date.year() == year
    }

    /// Check whether the expense date is within `start..=end`
    pub fn is_between(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.date >= start && self.date <= end
    }
}

impl LedgerEntry for Expense {
    fn amount(&self) -> Money {
        self.amount
    }

    fn label(&self) -> &str {
        &self.category
    }

    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Record for Expense {
    const PREFIX: &'static str = "expenses_";
    const ENTITY: EntityType = EntityType::Expense;

    type Draft = ExpenseDraft;
    type Patch = ExpensePatch;

    fn from_draft(id: String, draft: ExpenseDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            amount: draft.amount,
            category: draft.category,
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

    fn apply_patch(&mut self, patch: ExpensePatch) {
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(category) = patch.category {
            self.category = category;
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
                "Expense amount must be positive, got {}",
                self.amount
            )));
        }
        if self.category.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Expense category cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Expense {
        let draft = ExpenseDraft::new(
            Money::from_cents(4250),
            "Groceries",
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        );
        Expense::from_draft("e1".into(), draft, Utc::now())
    }

    #[test]
    fn test_from_draft_stamps_both_timestamps() {
        let expense = sample();
        assert_eq!(expense.id, "e1");
        assert_eq!(expense.created_at, expense.updated_at);
        assert!(expense.validate().is_ok());
    }

    #[test]
    fn test_month_uses_zero_based_index() {
        let expense = sample();
        assert!(expense.is_in_month(2, 2025));
        assert!(!expense.is_in_month(3, 2025));
        assert!(!expense.is_in_month(2, 2024));
        assert!(expense.is_in_year(2025));
    }

    #[test]
    fn test_patch_clears_note() {
        let mut expense = sample();
        expense.note = Some("weekly shop".into());
        expense.apply_patch(ExpensePatch {
            note: Some(None),
            ..Default::default()
        });
        assert!(expense.note.is_none());
        assert_eq!(expense.category, "Groceries");
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let mut expense = sample();
        expense.amount = Money::zero();
        assert!(expense.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_note_omitted_from_json_when_absent() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("note").is_none());
        assert_eq!(json["amount"], 4250);
    }
}

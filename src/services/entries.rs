//! Expense and income service
//!
//! Expenses and incomes share one shape (a dated amount under a label), so
//! one service covers both: CRUD that reports missing ids as errors, plus the
//! time-window and per-label queries the front end needs.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Expense, Income, LedgerEntry, Money};
use crate::storage::{RecordRepository, Storage};

/// Service for one kind of ledger entry
pub struct EntryService<'a, T: LedgerEntry> {
    repo: &'a RecordRepository<T>,
}

pub type ExpenseService<'a> = EntryService<'a, Expense>;
pub type IncomeService<'a> = EntryService<'a, Income>;

impl<'a> EntryService<'a, Expense> {
    pub fn expenses(storage: &'a Storage) -> Self {
        Self::new(&storage.expenses)
    }
}

impl<'a> EntryService<'a, Income> {
    pub fn incomes(storage: &'a Storage) -> Self {
        Self::new(&storage.incomes)
    }
}

/// Sum of entry amounts
pub fn total<T: LedgerEntry>(entries: &[T]) -> Money {
    entries.iter().map(|e| e.amount()).sum()
}

/// Per-label totals
pub fn totals_by_label<T: LedgerEntry>(entries: &[T]) -> BTreeMap<String, Money> {
    let mut totals = BTreeMap::new();
    for entry in entries {
        *totals.entry(entry.label().to_string()).or_insert_with(Money::zero) += entry.amount();
    }
    totals
}

impl<'a, T: LedgerEntry> EntryService<'a, T> {
    pub fn new(repo: &'a RecordRepository<T>) -> Self {
        Self { repo }
    }

    fn entity_name() -> &'static str {
        T::ENTITY.as_str()
    }

    pub async fn create(&self, draft: T::Draft) -> LedgerResult<T> {
        self.repo.create(draft).await
    }

    /// Get an entry, failing when it does not exist
    pub async fn get(&self, id: &str) -> LedgerResult<T> {
        self.repo
            .read(id)
            .await
            .ok_or_else(|| LedgerError::not_found(Self::entity_name(), id))
    }

    /// Every entry, newest date first
    pub async fn list(&self) -> Vec<T> {
        let mut entries = self.repo.list().await;
        entries.sort_by(|a, b| {
            b.date()
                .cmp(&a.date())
                .then_with(|| b.created_at().cmp(&a.created_at()))
        });
        entries
    }

    pub async fn update(&self, id: &str, patch: T::Patch) -> LedgerResult<T> {
        self.repo
            .update(id, patch)
            .await?
            .ok_or_else(|| LedgerError::not_found(Self::entity_name(), id))
    }

    /// Delete an entry; returns whether it existed
    pub async fn delete(&self, id: &str) -> LedgerResult<bool> {
        let existed = self.repo.read(id).await.is_some();
        self.repo.delete(id).await?;
        Ok(existed)
    }

    pub async fn clear(&self) -> LedgerResult<usize> {
        self.repo.clear_all().await
    }

    async fn filtered(&self, keep: impl Fn(&T) -> bool) -> Vec<T> {
        self.list().await.into_iter().filter(|e| keep(e)).collect()
    }

    /// Entries whose label matches exactly
    pub async fn by_label(&self, label: &str) -> Vec<T> {
        self.filtered(|e| e.label() == label).await
    }

    /// Entries dated within `start..=end`
    pub async fn between(&self, start: NaiveDate, end: NaiveDate) -> LedgerResult<Vec<T>> {
        if start > end {
            return Err(LedgerError::Validation(format!(
                "Start date {} is after end date {}",
                start, end
            )));
        }
        Ok(self
            .filtered(|e| e.date() >= start && e.date() <= end)
            .await)
    }

    /// Entries in a month (0-11) of a year
    pub async fn in_month(&self, month0: u32, year: i32) -> Vec<T> {
        self.filtered(|e| e.falls_in_month(month0, year)).await
    }

    pub async fn in_year(&self, year: i32) -> Vec<T> {
        self.filtered(|e| e.falls_in_year(year)).await
    }

    pub async fn total(&self) -> Money {
        total(&self.repo.list().await)
    }

    pub async fn total_in_month(&self, month0: u32, year: i32) -> Money {
        total(&self.in_month(month0, year).await)
    }

    /// Per-label totals, optionally restricted to one month
    pub async fn totals_by_label(&self, month: Option<(u32, i32)>) -> BTreeMap<String, Money> {
        let entries = match month {
            Some((month0, year)) => self.in_month(month0, year).await,
            None => self.repo.list().await,
        };
        totals_by_label(&entries)
    }

    /// The `n` labels with the largest totals, largest first
    pub async fn top_labels(&self, n: usize, month: Option<(u32, i32)>) -> Vec<(String, Money)> {
        let mut ranked: Vec<_> = self.totals_by_label(month).await.into_iter().collect();
        // Stable sort keeps ties in name order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);

        debug!(entity = Self::entity_name(), count = ranked.len(), "ranked labels");
        ranked
    }
}

//! Budget service and aggregation
//!
//! `BudgetService` manages budget records. `BudgetAggregator` derives
//! spend, availability and percentage figures for budgets from the stored
//! expenses at read time; nothing it computes is persisted.

use tracing::{debug, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    Budget, BudgetDraft, BudgetPatch, BudgetPeriod, BudgetSummary, Expense, GlobalBudgetStats,
    LedgerEntry, Money,
};
use crate::storage::Storage;

/// Amount spent against a budget
///
/// Monthly budgets count expenses in their month and year, yearly budgets
/// count their year. Weekly budgets, and budgets missing the month or year
/// their period needs, count nothing.
pub fn spent_against(budget: &Budget, expenses: &[Expense]) -> Money {
    let in_window = |expense: &Expense| match (budget.period, budget.month, budget.year) {
        (BudgetPeriod::Monthly, Some(month0), Some(year)) => expense.falls_in_month(month0, year),
        (BudgetPeriod::Yearly, _, Some(year)) => expense.falls_in_year(year),
        _ => false,
    };

    expenses
        .iter()
        .filter(|e| e.category == budget.category && in_window(e))
        .map(|e| e.amount)
        .sum()
}

/// Summarize one budget against a set of expenses
pub fn summarize_with(budget: Budget, expenses: &[Expense]) -> BudgetSummary {
    if budget.period == BudgetPeriod::Weekly {
        debug!(id = %budget.id, "weekly budgets are not aggregated");
    }
    let spent = spent_against(&budget, expenses);
    BudgetSummary::new(budget, spent)
}

/// Service for budget records
pub struct BudgetService<'a> {
    storage: &'a Storage,
}

impl<'a> BudgetService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn create(&self, draft: BudgetDraft) -> LedgerResult<Budget> {
        if draft.period == BudgetPeriod::Weekly {
            warn!(category = %draft.category, "weekly budget created; it will always report zero spend");
        }
        self.storage.budgets.create(draft).await
    }

    /// Get a budget, failing when it does not exist
    pub async fn get(&self, id: &str) -> LedgerResult<Budget> {
        self.storage
            .budgets
            .read(id)
            .await
            .ok_or_else(|| LedgerError::not_found("Budget", id))
    }

    /// Every budget, ordered by year, month and category
    pub async fn list(&self) -> Vec<Budget> {
        let mut budgets = self.storage.budgets.list().await;
        budgets.sort_by(|a, b| {
            b.year
                .cmp(&a.year)
                .then_with(|| b.month.cmp(&a.month))
                .then_with(|| a.category.cmp(&b.category))
        });
        budgets
    }

    pub async fn update(&self, id: &str, patch: BudgetPatch) -> LedgerResult<Budget> {
        self.storage
            .budgets
            .update(id, patch)
            .await?
            .ok_or_else(|| LedgerError::not_found("Budget", id))
    }

    /// Delete a budget; returns whether it existed
    pub async fn delete(&self, id: &str) -> LedgerResult<bool> {
        let existed = self.storage.budgets.read(id).await.is_some();
        self.storage.budgets.delete(id).await?;
        Ok(existed)
    }

    pub async fn clear(&self) -> LedgerResult<usize> {
        self.storage.budgets.clear_all().await
    }

    /// Budgets of one period kind
    pub async fn by_period(&self, period: BudgetPeriod) -> Vec<Budget> {
        self.list()
            .await
            .into_iter()
            .filter(|b| b.period == period)
            .collect()
    }

    /// The monthly budget for a category in a month (0-11) of a year
    pub async fn monthly_for_category(
        &self,
        category: &str,
        month0: u32,
        year: i32,
    ) -> Option<Budget> {
        self.storage
            .budgets
            .list()
            .await
            .into_iter()
            .find(|b| {
                b.period == BudgetPeriod::Monthly
                    && b.category == category
                    && b.month == Some(month0)
                    && b.year == Some(year)
            })
    }
}

/// Derives budget summaries from budgets and expenses
pub struct BudgetAggregator<'a> {
    storage: &'a Storage,
}

impl<'a> BudgetAggregator<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Summary for one budget
    pub async fn summarize(&self, budget: Budget) -> BudgetSummary {
        let expenses = self.storage.expenses.list().await;
        summarize_with(budget, &expenses)
    }

    /// Summary for a stored budget; `None` when the id does not exist
    pub async fn summarize_by_id(&self, id: &str) -> Option<BudgetSummary> {
        let budget = self.storage.budgets.read(id).await?;
        Some(self.summarize(budget).await)
    }

    /// Summaries for every stored budget, unordered
    pub async fn summarize_all(&self) -> Vec<BudgetSummary> {
        let (budgets, expenses) = tokio::join!(
            self.storage.budgets.list(),
            self.storage.expenses.list()
        );

        debug!(
            budgets = budgets.len(),
            expenses = expenses.len(),
            "summarizing budgets"
        );
        budgets
            .into_iter()
            .map(|budget| summarize_with(budget, &expenses))
            .collect()
    }

    /// Totals across every budget
    pub async fn global_stats(&self) -> GlobalBudgetStats {
        GlobalBudgetStats::from_summaries(&self.summarize_all().await)
    }

    /// Budgets whose spend is strictly above the assigned amount
    pub async fn exceeded(&self) -> Vec<BudgetSummary> {
        self.summarize_all()
            .await
            .into_iter()
            .filter(|s| s.exceeded)
            .collect()
    }

    /// Budgets at or above `threshold_percent` used but not yet exceeded
    pub async fn near_limit(&self, threshold_percent: f64) -> Vec<BudgetSummary> {
        self.summarize_all()
            .await
            .into_iter()
            .filter(|s| !s.exceeded && s.percent_used >= threshold_percent)
            .collect()
    }
}

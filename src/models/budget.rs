//! Budget model and derived budget summaries
//!
//! A budget assigns an amount to one category for a period. Its summary
//! (spent, available, percent used) is derived from expenses at read time and
//! never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::Money;
use super::record::{EntityType, Record};
use crate::error::{LedgerError, LedgerResult};

/// Period a budget covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Monthly,
    /// Accepted and stored, but not aggregated: weekly budgets report zero spend
    Weekly,
    Yearly,
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Monthly => write!(f, "monthly"),
            Self::Weekly => write!(f, "weekly"),
            Self::Yearly => write!(f, "yearly"),
        }
    }
}

impl std::str::FromStr for BudgetPeriod {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "weekly" => Ok(Self::Weekly),
            "yearly" => Ok(Self::Yearly),
            other => Err(LedgerError::Validation(format!(
                "Unknown budget period '{}': expected monthly, weekly or yearly",
                other
            ))),
        }
    }
}

/// A spending budget for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,

    /// Category name; expenses match it exactly
    pub category: String,

    pub assigned_amount: Money,

    pub period: BudgetPeriod,

    /// Month index 0-11 (January = 0), used by monthly budgets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,

    /// Calendar year, used by monthly and yearly budgets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    pub alert_enabled: bool,

    /// Warn once this share of the budget (0-100) has been spent
    pub alert_threshold_percent: f64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new budget
#[derive(Debug, Clone)]
pub struct BudgetDraft {
    pub category: String,
    pub assigned_amount: Money,
    pub period: BudgetPeriod,
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub alert_enabled: bool,
    pub alert_threshold_percent: f64,
}

impl BudgetDraft {
    /// A monthly budget with alerts on at 80%
    pub fn monthly(category: impl Into<String>, assigned: Money, month0: u32, year: i32) -> Self {
        Self {
            category: category.into(),
            assigned_amount: assigned,
            period: BudgetPeriod::Monthly,
            month: Some(month0),
            year: Some(year),
            alert_enabled: true,
            alert_threshold_percent: 80.0,
        }
    }

    /// A yearly budget with alerts on at 80%
    pub fn yearly(category: impl Into<String>, assigned: Money, year: i32) -> Self {
        Self {
            category: category.into(),
            assigned_amount: assigned,
            period: BudgetPeriod::Yearly,
            month: None,
            year: Some(year),
            alert_enabled: true,
            alert_threshold_percent: 80.0,
        }
    }

    pub fn with_alert(mut self, enabled: bool, threshold_percent: f64) -> Self {
        self.alert_enabled = enabled;
        self.alert_threshold_percent = threshold_percent;
        self
    }
}

/// Partial update for a budget
#[derive(Debug, Clone, Default)]
pub struct BudgetPatch {
    pub category: Option<String>,
    pub assigned_amount: Option<Money>,
    pub period: Option<BudgetPeriod>,
    pub month: Option<Option<u32>>,
    pub year: Option<Option<i32>>,
    pub alert_enabled: Option<bool>,
    pub alert_threshold_percent: Option<f64>,
}

impl Record for Budget {
    const PREFIX: &'static str = "budgets_";
    const ENTITY: EntityType = EntityType::Budget;

    type Draft = BudgetDraft;
    type Patch = BudgetPatch;

    fn from_draft(id: String, draft: BudgetDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            category: draft.category,
            assigned_amount: draft.assigned_amount,
            period: draft.period,
            month: draft.month,
            year: draft.year,
            alert_enabled: draft.alert_enabled,
            alert_threshold_percent: draft.alert_threshold_percent,
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

    fn apply_patch(&mut self, patch: BudgetPatch) {
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(amount) = patch.assigned_amount {
            self.assigned_amount = amount;
        }
        if let Some(period) = patch.period {
            self.period = period;
        }
        if let Some(month) = patch.month {
            self.month = month;
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(enabled) = patch.alert_enabled {
            self.alert_enabled = enabled;
        }
        if let Some(threshold) = patch.alert_threshold_percent {
            self.alert_threshold_percent = threshold;
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn validate(&self) -> LedgerResult<()> {
        if self.category.trim().is_empty() {
            return Err(LedgerError::Validation("Budget category cannot be empty".into()));
        }
        if !self.assigned_amount.is_positive() {
            return Err(LedgerError::Validation(format!(
                "Budget amount must be positive, got {}",
                self.assigned_amount
            )));
        }
        if !(0.0..=100.0).contains(&self.alert_threshold_percent) {
            return Err(LedgerError::Validation(format!(
                "Alert threshold must be 0-100, got {}",
                self.alert_threshold_percent
            )));
        }
        if let Some(month) = self.month {
            if month > 11 {
                return Err(LedgerError::Validation(format!(
                    "Budget month must be 0-11, got {}",
                    month
                )));
            }
        }

        match self.period {
            BudgetPeriod::Monthly if self.month.is_none() || self.year.is_none() => Err(
                LedgerError::Validation("Monthly budgets need both month and year".into()),
            ),
            BudgetPeriod::Yearly if self.year.is_none() => {
                Err(LedgerError::Validation("Yearly budgets need a year".into()))
            }
            _ => Ok(()),
        }
    }
}

/// Spend versus assignment for one budget
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetSummary {
    pub budget: Budget,
    pub spent: Money,

    /// `assigned - spent`, negative when overspent
    pub available: Money,

    /// `spent / assigned * 100`, or 0 when nothing is assigned
    pub percent_used: f64,

    /// `spent > assigned` (strict)
    pub exceeded: bool,
}

impl BudgetSummary {
    /// Derive a summary from a budget and the amount spent against it
    pub fn new(budget: Budget, spent: Money) -> Self {
        let assigned = budget.assigned_amount;
        Self {
            available: assigned - spent,
            percent_used: spent.percent_of(assigned),
            exceeded: spent > assigned,
            spent,
            budget,
        }
    }
}

impl fmt::Display for BudgetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: spent {} of {} ({:.1}%)",
            self.budget.category, self.spent, self.budget.assigned_amount, self.percent_used
        )
    }
}

/// Totals across every budget summary
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlobalBudgetStats {
    pub total_assigned: Money,
    pub total_spent: Money,
    pub total_available: Money,
    pub global_percent_used: f64,
}

impl GlobalBudgetStats {
    pub fn from_summaries(summaries: &[BudgetSummary]) -> Self {
        let total_assigned: Money = summaries.iter().map(|s| s.budget.assigned_amount).sum();
        let total_spent: Money = summaries.iter().map(|s| s.spent).sum();
        let total_available: Money = summaries.iter().map(|s| s.available).sum();

        Self {
            total_assigned,
            total_spent,
            total_available,
            global_percent_used: total_spent.percent_of(total_assigned),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(assigned_cents: i64) -> Budget {
        let draft = BudgetDraft::monthly("Dining", Money::from_cents(assigned_cents), 4, 2025);
        Budget::from_draft("b1".into(), draft, Utc::now())
    }

    #[test]
    fn test_summary_figures() {
        let summary = BudgetSummary::new(budget(50000), Money::from_cents(30000));
        assert_eq!(summary.available.cents(), 20000);
        assert_eq!(summary.percent_used, 60.0);
        assert!(!summary.exceeded);
    }

    #[test]
    fn test_exceeded_is_strict() {
        let at_limit = BudgetSummary::new(budget(10000), Money::from_cents(10000));
        assert!(!at_limit.exceeded);
        assert_eq!(at_limit.available, Money::zero());

        let over = BudgetSummary::new(budget(10000), Money::from_cents(10001));
        assert!(over.exceeded);
        assert_eq!(over.available.cents(), -1);
    }

    #[test]
    fn test_zero_assigned_gives_zero_percent() {
        let mut b = budget(100);
        b.assigned_amount = Money::zero();
        let summary = BudgetSummary::new(b, Money::from_cents(2500));

        assert_eq!(summary.percent_used, 0.0);
        assert!(summary.percent_used.is_finite());
        assert!(summary.exceeded);
    }

    #[test]
    fn test_validation() {
        assert!(budget(100).validate().is_ok());

        let mut no_month = budget(100);
        no_month.month = None;
        assert!(no_month.validate().is_err());

        let mut bad_month = budget(100);
        bad_month.month = Some(12);
        assert!(bad_month.validate().is_err());

        let mut bad_threshold = budget(100);
        bad_threshold.alert_threshold_percent = 120.0;
        assert!(bad_threshold.validate().is_err());

        let mut weekly = budget(100);
        weekly.period = BudgetPeriod::Weekly;
        weekly.month = None;
        weekly.year = None;
        assert!(weekly.validate().is_ok());
    }

    #[test]
    fn test_period_parse_and_serde() {
        assert_eq!("Monthly".parse::<BudgetPeriod>().unwrap(), BudgetPeriod::Monthly);
        assert!("daily".parse::<BudgetPeriod>().is_err());
        assert_eq!(
            serde_json::to_string(&BudgetPeriod::Yearly).unwrap(),
            "\"yearly\""
        );
    }

    #[test]
    fn test_global_stats() {
        let summaries = vec![
            BudgetSummary::new(budget(50000), Money::from_cents(30000)),
            BudgetSummary::new(budget(50000), Money::from_cents(60000)),
        ];
        let stats = GlobalBudgetStats::from_summaries(&summaries);

        assert_eq!(stats.total_assigned.cents(), 100000);
        assert_eq!(stats.total_spent.cents(), 90000);
        assert_eq!(stats.total_available.cents(), 10000);
        assert_eq!(stats.global_percent_used, 90.0);
    }

    #[test]
    fn test_global_stats_empty() {
        let stats = GlobalBudgetStats::from_summaries(&[]);
        assert_eq!(stats.total_assigned, Money::zero());
        assert_eq!(stats.global_percent_used, 0.0);
    }
}

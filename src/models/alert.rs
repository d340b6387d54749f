//! Budget alerts
//!
//! An alert is derived from a budget summary and never stored.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::budget::BudgetSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    /// Spend is strictly above the assigned amount
    Exceeded,
    /// Spend reached the budget's alert threshold
    Warning,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exceeded => write!(f, "exceeded"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub summary: BudgetSummary,
}

impl Alert {
    /// Classify a summary; `None` when the budget has alerts disabled or is
    /// below its threshold
    pub fn classify(summary: &BudgetSummary) -> Option<AlertKind> {
        if !summary.budget.alert_enabled {
            return None;
        }
        if summary.exceeded {
            Some(AlertKind::Exceeded)
        } else if summary.percent_used >= summary.budget.alert_threshold_percent {
            Some(AlertKind::Warning)
        } else {
            None
        }
    }

    pub fn category(&self) -> &str {
        &self.summary.budget.category
    }

    /// Title shown for this alert on every delivery path
    pub fn title(&self) -> &'static str {
        match self.kind {
            AlertKind::Exceeded => "Budget exceeded",
            AlertKind::Warning => "Budget alert",
        }
    }

    /// Body shown for this alert on every delivery path
    pub fn body(&self) -> String {
        match self.kind {
            AlertKind::Exceeded => format!(
                "You have gone over your {} budget ({:.1}% used)",
                self.category(),
                self.summary.percent_used
            ),
            AlertKind::Warning => format!(
                "Your {} budget is at {:.1}%",
                self.category(),
                self.summary.percent_used
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::budget::{Budget, BudgetDraft};
    use crate::models::record::Record;
    use crate::models::Money;
    use chrono::Utc;

    fn summary(threshold: f64, enabled: bool, assigned: i64, spent: i64) -> BudgetSummary {
        let draft = BudgetDraft::monthly("Transport", Money::from_cents(assigned), 0, 2025)
            .with_alert(enabled, threshold);
        BudgetSummary::new(
            Budget::from_draft("b".into(), draft, Utc::now()),
            Money::from_cents(spent),
        )
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(
            Alert::classify(&summary(80.0, true, 10000, 8000)),
            Some(AlertKind::Warning)
        );
        assert_eq!(Alert::classify(&summary(80.0, true, 10000, 7999)), None);
    }

    #[test]
    fn test_exceeded_dominates_warning() {
        assert_eq!(
            Alert::classify(&summary(50.0, true, 10000, 10001)),
            Some(AlertKind::Exceeded)
        );
    }

    #[test]
    fn test_disabled_never_alerts() {
        assert_eq!(Alert::classify(&summary(0.0, false, 10000, 99999)), None);
    }

    #[test]
    fn test_wording_by_kind() {
        let alert = Alert {
            kind: AlertKind::Warning,
            summary: summary(80.0, true, 10000, 8500),
        };
        assert_eq!(alert.title(), "Budget alert");
        assert_eq!(alert.body(), "Your Transport budget is at 85.0%");
    }
}

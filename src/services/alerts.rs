//! Budget alert evaluation

use tracing::debug;

use super::budget::BudgetAggregator;
use crate::models::{Alert, BudgetSummary};
use crate::storage::Storage;

/// Alerts for a set of summaries, unordered
pub fn alerts_for(summaries: Vec<BudgetSummary>) -> Vec<Alert> {
    summaries
        .into_iter()
        .filter_map(|summary| Alert::classify(&summary).map(|kind| Alert { kind, summary }))
        .collect()
}

/// Classifies every budget into exceeded / warning / nothing
pub struct AlertEvaluator<'a> {
    aggregator: BudgetAggregator<'a>,
}

impl<'a> AlertEvaluator<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            aggregator: BudgetAggregator::new(storage),
        }
    }

    pub async fn evaluate(&self) -> Vec<Alert> {
        let alerts = alerts_for(self.aggregator.summarize_all().await);
        debug!(count = alerts.len(), "evaluated budget alerts");
        alerts
    }
}

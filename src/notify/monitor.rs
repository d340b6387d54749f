//! Budget alert pipeline
//!
//! Evaluates budget alerts and hands them to the scheduler, unless the user
//! turned budget notifications off. Can also follow the store's event bus and
//! re-check whenever expenses or budgets change.

use serde::Serialize;
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tracing::{debug, info, warn};

use super::scheduler::{BatchReport, NotificationScheduler};
use super::sink::{InstantNotifier, NotificationSink};
use crate::events::StoreEvent;
use crate::models::EntityType;
use crate::services::{AlertEvaluator, PreferencesService};
use crate::storage::Storage;

/// Result of one monitor pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum MonitorOutcome {
    /// Budget notifications are turned off for this user
    Disabled,
    Checked { alerts: usize, report: BatchReport },
}

pub struct BudgetMonitor<'a, S, F> {
    storage: &'a Storage,
    scheduler: &'a NotificationScheduler<S, F>,
    user_id: String,
}

impl<'a, S: NotificationSink, F: InstantNotifier> BudgetMonitor<'a, S, F> {
    pub fn new(
        storage: &'a Storage,
        scheduler: &'a NotificationScheduler<S, F>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            scheduler,
            user_id: user_id.into(),
        }
    }

    /// Evaluate alerts and schedule them
    pub async fn check(&self) -> MonitorOutcome {
        let preferences = PreferencesService::new(self.storage, self.user_id.as_str())
            .get()
            .await;
        if !preferences.notifications.budgets {
            debug!(user_id = %self.user_id, "budget notifications disabled");
            return MonitorOutcome::Disabled;
        }

        let alerts = AlertEvaluator::new(self.storage).evaluate().await;
        let report = self.scheduler.schedule_alert_batch(&alerts).await;
        info!(alerts = alerts.len(), failed = report.failed, "budget check complete");

        MonitorOutcome::Checked {
            alerts: alerts.len(),
            report,
        }
    }

    /// Re-check after a change that can move budget figures
    pub async fn handle(&self, event: &StoreEvent) -> Option<MonitorOutcome> {
        match event.entity {
            EntityType::Expense | EntityType::Budget => Some(self.check().await),
            _ => None,
        }
    }

    /// Follow an event stream until it closes; returns how many checks ran
    pub async fn run(&self, mut events: Receiver<StoreEvent>) -> usize {
        let mut checks = 0;
        loop {
            match events.recv().await {
                Ok(event) => {
                    if self.handle(&event).await.is_some() {
                        checks += 1;
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "budget monitor fell behind, re-checking");
                    self.check().await;
                    checks += 1;
                }
                Err(RecvError::Closed) => break,
            }
        }
        checks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventBus, Operation};
    use crate::models::{BudgetDraft, ExpenseDraft, Money};
    use crate::notify::sink::{MemoryNotifier, MemorySink};
    use chrono::NaiveDate;

    async fn overspent(storage: &Storage) {
        storage
            .budgets
            .create(BudgetDraft::monthly("Food", Money::from_cents(10000), 0, 2025))
            .await
            .unwrap();
        storage
            .expenses
            .create(ExpenseDraft::new(
                Money::from_cents(15000),
                "Food",
                NaiveDate::from_ymd_opt(2025, 1, 4).unwrap(),
            ))
            .await
            .unwrap();
    }

    fn scheduler() -> NotificationScheduler<MemorySink, MemoryNotifier> {
        NotificationScheduler::new(MemorySink::new(), MemoryNotifier::granted())
    }

    #[tokio::test]
    async fn test_check_schedules_alerts() {
        let storage = Storage::in_memory();
        overspent(&storage).await;
        let scheduler = scheduler();

        let outcome = BudgetMonitor::new(&storage, &scheduler, "local").check().await;

        match outcome {
            MonitorOutcome::Checked { alerts, report } => {
                assert_eq!(alerts, 1);
                assert_eq!(report.scheduled.len(), 1);
            }
            MonitorOutcome::Disabled => panic!("monitor should be enabled by default"),
        }
        assert_eq!(scheduler.sink().pending()[0].title, "Budget exceeded");
    }

    #[tokio::test]
    async fn test_check_respects_preference() {
        let storage = Storage::in_memory();
        overspent(&storage).await;
        PreferencesService::new(&storage, "local")
            .update(|c| c.notifications.budgets = false)
            .await
            .unwrap();
        let scheduler = scheduler();

        let outcome = BudgetMonitor::new(&storage, &scheduler, "local").check().await;

        assert_eq!(outcome, MonitorOutcome::Disabled);
        assert!(scheduler.sink().pending().is_empty());
    }

    #[tokio::test]
    async fn test_run_reacts_to_relevant_events() {
        let storage = Storage::in_memory();
        overspent(&storage).await;
        let scheduler = scheduler();
        let monitor = BudgetMonitor::new(&storage, &scheduler, "local");

        let bus = EventBus::new();
        let rx = bus.subscribe();
        bus.publish(StoreEvent::new(EntityType::Expense, Operation::Create, "e1"));
        bus.publish(StoreEvent::new(EntityType::Income, Operation::Create, "i1"));
        bus.publish(StoreEvent::cleared(EntityType::Budget));
        drop(bus);

        assert_eq!(monitor.run(rx).await, 2);
    }
}

//! Notification scheduling
//!
//! Turns budget alerts, reminders and the daily summary into notifications.
//! When the native sink is available everything is scheduled through it;
//! otherwise alerts and immediate messages are shown at once through the
//! fallback notifier with the same title and body, and time-based
//! notifications are skipped.

use chrono::{DateTime, Duration, Local, NaiveDateTime, NaiveTime, TimeZone, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::sink::{InstantNotifier, NotificationSink};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Alert, PermissionState, Recurrence, ScheduledNotification};

/// Fixed id of the recurring daily summary
pub const DAILY_SUMMARY_ID: i32 = 999;

/// Default gap between notifications of one alert batch
pub const DEFAULT_SPACING_MS: i64 = 1000;

const ID_MODULUS: i64 = 1_000_000_000;

/// What happened to one delivery request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "delivery", content = "id")]
pub enum Delivery {
    /// Handed to the native sink under this id
    Scheduled(i32),
    /// Shown at once by the fallback notifier
    Shown,
    /// Not delivered (no permission, or nothing can deliver it)
    Skipped,
}

/// Outcome of an alert batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Ids accepted by the native sink
    pub scheduled: Vec<i32>,
    /// Alerts shown through the fallback notifier
    pub shown: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// First id of a batch started at `now`: milliseconds since the epoch
/// modulo 10^9, so that `base + index` stays inside `i32`
///
/// Bases at or below [`DAILY_SUMMARY_ID`] are moved up by 1000 so that no
/// batch or reminder can replace the daily summary.
pub fn batch_base_id(now: DateTime<Utc>) -> i32 {
    // rem_euclid keeps this in 0..10^9 even for pre-epoch clocks
    let base = now.timestamp_millis().rem_euclid(ID_MODULUS) as i32;
    if base <= DAILY_SUMMARY_ID {
        base + 1000
    } else {
        base
    }
}

/// Next `hour:00` strictly after `now`: today if still ahead, else tomorrow
pub fn next_daily_occurrence(now: NaiveDateTime, hour: u32) -> LedgerResult<NaiveDateTime> {
    let time = NaiveTime::from_hms_opt(hour, 0, 0).ok_or_else(|| {
        LedgerError::Validation(format!("Hour of day must be 0-23, got {}", hour))
    })?;

    let today = now.date().and_time(time);
    if today > now {
        Ok(today)
    } else {
        Ok(today + Duration::days(1))
    }
}

/// Resolve a local wall-clock time, shifting past a DST gap if needed
fn local_to_utc(local: NaiveDateTime) -> DateTime<Utc> {
    match Local.from_local_datetime(&local).earliest() {
        Some(resolved) => resolved.with_timezone(&Utc),
        None => {
            let shifted = local + Duration::hours(1);
            Local
                .from_local_datetime(&shifted)
                .earliest()
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or_else(|| Utc.from_utc_datetime(&local))
        }
    }
}

fn immediate_id() -> i32 {
    // Disjoint from DAILY_SUMMARY_ID
    rand::thread_rng().gen_range(1000..100_000)
}

/// Schedules notifications against a native sink with an instant fallback
pub struct NotificationScheduler<S, F> {
    sink: S,
    fallback: F,
    spacing: Duration,
}

impl<S: NotificationSink, F: InstantNotifier> NotificationScheduler<S, F> {
    pub fn new(sink: S, fallback: F) -> Self {
        Self {
            sink,
            fallback,
            spacing: Duration::milliseconds(DEFAULT_SPACING_MS),
        }
    }

    /// Gap between consecutive notifications of one alert batch
    pub fn with_spacing(mut self, spacing: Duration) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn fallback(&self) -> &F {
        &self.fallback
    }

    /// Whether notifications go through the native sink
    pub fn is_native(&self) -> bool {
        self.sink.is_available()
    }

    /// Current permission on whichever path is active
    pub async fn permission_state(&self) -> PermissionState {
        if !self.is_native() {
            return self.fallback.permission();
        }
        self.sink.check_permission().await.unwrap_or_else(|e| {
            warn!(error = %e, "permission check failed");
            PermissionState::Denied
        })
    }

    /// Ask for permission if it has not been decided yet
    pub async fn ensure_permission(&self) -> PermissionState {
        let current = self.permission_state().await;
        if current != PermissionState::Undetermined {
            return current;
        }

        let outcome = if self.is_native() {
            self.sink.request_permission().await.unwrap_or_else(|e| {
                warn!(error = %e, "permission request failed");
                PermissionState::Denied
            })
        } else {
            self.fallback.request_permission().await
        };
        info!(?outcome, native = self.is_native(), "notification permission requested");
        outcome
    }

    /// Notifications for an alert batch started at `now`
    ///
    /// Alert `i` gets id `base + i` and fires `spacing * (i + 1)` after `now`.
    pub fn build_alert_batch(
        &self,
        alerts: &[Alert],
        now: DateTime<Utc>,
    ) -> Vec<ScheduledNotification> {
        let base = batch_base_id(now);
        alerts
            .iter()
            .enumerate()
            .map(|(i, alert)| {
                let offset = i32::try_from(i).unwrap_or(i32::MAX - base);
                let fire_at = now + self.spacing * (offset + 1);
                ScheduledNotification::new(base + offset, alert.title(), alert.body(), fire_at)
                    .with_payload("category", alert.category())
                    .with_payload("kind", alert.kind.to_string())
                    .with_payload("budget_id", alert.summary.budget.id.clone())
            })
            .collect()
    }

    /// Deliver one notification per alert
    ///
    /// A notification that fails is logged and counted; the rest are still
    /// attempted.
    pub async fn schedule_alert_batch(&self, alerts: &[Alert]) -> BatchReport {
        self.schedule_alert_batch_at(alerts, Utc::now()).await
    }

    pub async fn schedule_alert_batch_at(
        &self,
        alerts: &[Alert],
        now: DateTime<Utc>,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        if alerts.is_empty() {
            return report;
        }

        if !self.ensure_permission().await.is_granted() {
            info!(count = alerts.len(), "notifications not permitted, skipping alerts");
            report.skipped = alerts.len();
            return report;
        }

        if !self.is_native() {
            for alert in alerts {
                match self.fallback.show(alert.title(), &alert.body()) {
                    Ok(()) => report.shown += 1,
                    Err(e) => {
                        warn!(category = alert.category(), error = %e, "failed to show alert");
                        report.failed += 1;
                    }
                }
            }
            return report;
        }

        for notification in self.build_alert_batch(alerts, now) {
            let id = notification.id;
            match self.sink.schedule(notification).await {
                Ok(()) => report.scheduled.push(id),
                Err(e) => {
                    warn!(id, error = %e, "failed to schedule alert notification");
                    report.failed += 1;
                }
            }
        }

        debug!(?report, "scheduled alert batch");
        report
    }

    /// One notification about a second from now
    pub async fn schedule_immediate(&self, title: &str, body: &str) -> LedgerResult<Delivery> {
        if !self.ensure_permission().await.is_granted() {
            return Ok(Delivery::Skipped);
        }

        if !self.is_native() {
            self.fallback.show(title, body)?;
            return Ok(Delivery::Shown);
        }

        let id = immediate_id();
        let fire_at = Utc::now() + Duration::seconds(1);
        self.sink
            .schedule(ScheduledNotification::new(id, title, body, fire_at))
            .await?;
        Ok(Delivery::Scheduled(id))
    }

    /// Recurring summary at `hour:00` local time every day
    ///
    /// Always uses [`DAILY_SUMMARY_ID`], so a later call replaces an earlier
    /// one.
    pub async fn schedule_daily_summary(&self, hour: u32) -> LedgerResult<Delivery> {
        let next = next_daily_occurrence(Local::now().naive_local(), hour)?;

        if !self.is_native() {
            info!("daily summary needs native notifications, skipping");
            return Ok(Delivery::Skipped);
        }
        if !self.ensure_permission().await.is_granted() {
            return Ok(Delivery::Skipped);
        }

        let notification = ScheduledNotification::new(
            DAILY_SUMMARY_ID,
            "Daily summary",
            "Review today's spending and your budgets",
            local_to_utc(next),
        )
        .recurring(Recurrence::Daily)
        .with_payload("kind", "daily_summary");

        self.sink.schedule(notification).await?;
        info!(hour, next = %next, "scheduled daily summary");
        Ok(Delivery::Scheduled(DAILY_SUMMARY_ID))
    }

    pub async fn cancel_daily_summary(&self) -> LedgerResult<()> {
        if !self.is_native() {
            debug!("no native sink, nothing to cancel");
            return Ok(());
        }
        self.sink.cancel(&[DAILY_SUMMARY_ID]).await?;
        info!("cancelled daily summary");
        Ok(())
    }

    /// One-shot reminder at `at`; native sink only
    pub async fn schedule_reminder(
        &self,
        title: &str,
        body: &str,
        at: DateTime<Utc>,
    ) -> LedgerResult<Delivery> {
        if !self.is_native() {
            info!("reminders need native notifications, skipping");
            return Ok(Delivery::Skipped);
        }
        if !self.ensure_permission().await.is_granted() {
            return Ok(Delivery::Skipped);
        }

        let id = batch_base_id(Utc::now());
        self.sink
            .schedule(
                ScheduledNotification::new(id, title, body, at).with_payload("kind", "reminder"),
            )
            .await?;
        Ok(Delivery::Scheduled(id))
    }

    /// Clear delivered notifications; a no-op without a native sink
    pub async fn clear_delivered(&self) -> LedgerResult<()> {
        if !self.is_native() {
            return Ok(());
        }
        self.sink.clear_delivered().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertKind, Budget, BudgetDraft, BudgetSummary, Money, Record};
    use crate::notify::sink::{MemoryNotifier, MemorySink, NoNativeSink};
    use chrono::NaiveDate;
    use std::collections::HashSet;

    fn alert(category: &str, spent: i64) -> Alert {
        let budget = Budget::from_draft(
            format!("b-{}", category),
            BudgetDraft::monthly(category, Money::from_cents(10000), 0, 2025),
            Utc::now(),
        );
        let summary = BudgetSummary::new(budget, Money::from_cents(spent));
        let kind = Alert::classify(&summary).unwrap();
        Alert { kind, summary }
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn native() -> NotificationScheduler<MemorySink, MemoryNotifier> {
        NotificationScheduler::new(MemorySink::new(), MemoryNotifier::granted())
    }

    #[test]
    fn test_batch_ids_distinct_and_in_range() {
        let scheduler = native();
        let alerts: Vec<_> = (0..50).map(|i| alert(&format!("c{}", i), 9000)).collect();
        // Largest millisecond value below the modulus
        let now = Utc.timestamp_millis_opt(1_999_999_999_999).unwrap();

        let batch = scheduler.build_alert_batch(&alerts, now);
        let ids: HashSet<i32> = batch.iter().map(|n| n.id).collect();

        assert_eq!(ids.len(), 50);
        assert!(batch.iter().all(|n| n.id >= 0));
        assert_eq!(batch[0].id, 999_999_999);
        assert_eq!(batch[49].id, 999_999_999 + 49);
    }

    #[tokio::test]
    async fn test_batch_never_replaces_daily_summary() {
        let scheduler = native();
        scheduler.schedule_daily_summary(20).await.unwrap();

        for millis in [1_700_000_000_999, 1_700_000_000_000, 1_700_000_000_990] {
            let now = Utc.timestamp_millis_opt(millis).unwrap();
            let alerts: Vec<_> = (0..20).map(|i| alert(&format!("c{}", i), 12000)).collect();
            let report = scheduler.schedule_alert_batch_at(&alerts, now).await;
            assert!(!report.scheduled.contains(&DAILY_SUMMARY_ID));
        }

        let daily = scheduler
            .sink()
            .pending()
            .into_iter()
            .find(|n| n.id == DAILY_SUMMARY_ID)
            .unwrap();
        assert_eq!(daily.recurrence, Recurrence::Daily);
        assert_eq!(batch_base_id(Utc.timestamp_millis_opt(1_700_000_000_999).unwrap()), 1999);
    }

    #[test]
    fn test_batch_spacing_and_payload() {
        let scheduler = native();
        let now = Utc::now();
        let batch = scheduler.build_alert_batch(&[alert("Food", 9000), alert("Fun", 12000)], now);

        assert_eq!(batch[0].fire_at, now + Duration::seconds(1));
        assert_eq!(batch[1].fire_at, now + Duration::seconds(2));
        assert_eq!(batch[0].payload["category"], "Food");
        assert_eq!(batch[0].payload["kind"], "warning");
        assert_eq!(batch[1].payload["kind"], "exceeded");
        assert_eq!(batch[1].title, "Budget exceeded");
        assert_eq!(batch[1].id, batch[0].id + 1);
    }

    #[test]
    fn test_custom_spacing() {
        let scheduler = native().with_spacing(Duration::milliseconds(250));
        let now = Utc::now();
        let batch = scheduler.build_alert_batch(&[alert("A", 9000), alert("B", 9000)], now);
        assert_eq!(batch[1].fire_at, now + Duration::milliseconds(500));
    }

    #[tokio::test]
    async fn test_batch_continues_after_failure() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let base = batch_base_id(now);
        let scheduler =
            NotificationScheduler::new(MemorySink::new().failing_on(base + 1), MemoryNotifier::granted());

        let alerts = [alert("A", 9000), alert("B", 9000), alert("C", 9000)];
        let report = scheduler.schedule_alert_batch_at(&alerts, now).await;

        assert_eq!(report.scheduled, vec![base, base + 2]);
        assert_eq!(report.failed, 1);
        assert_eq!(scheduler.sink().pending().len(), 2);
    }

    #[tokio::test]
    async fn test_fallback_delivers_same_content() {
        let alerts = [alert("Food", 9000), alert("Fun", 12000)];

        let native = native();
        let now = Utc::now();
        native.schedule_alert_batch_at(&alerts, now).await;
        let native_content: Vec<_> = native
            .sink()
            .pending()
            .into_iter()
            .map(|n| (n.title, n.body))
            .collect();

        let fallback = NotificationScheduler::new(NoNativeSink, MemoryNotifier::granted());
        let report = fallback.schedule_alert_batch_at(&alerts, now).await;

        assert_eq!(report.shown, 2);
        assert_eq!(fallback.fallback().shown(), native_content);
    }

    #[tokio::test]
    async fn test_fallback_requests_permission_then_respects_denial() {
        let denied = NotificationScheduler::new(
            NoNativeSink,
            MemoryNotifier::new(PermissionState::Undetermined, PermissionState::Denied),
        );
        let report = denied.schedule_alert_batch(&[alert("Food", 9000)]).await;
        assert_eq!(report.skipped, 1);
        assert!(denied.fallback().shown().is_empty());
        assert_eq!(denied.permission_state().await, PermissionState::Denied);

        let granted = NotificationScheduler::new(
            NoNativeSink,
            MemoryNotifier::new(PermissionState::Undetermined, PermissionState::Granted),
        );
        let report = granted.schedule_alert_batch(&[alert("Food", 9000)]).await;
        assert_eq!(report.shown, 1);
    }

    #[tokio::test]
    async fn test_native_denied_skips() {
        let scheduler = NotificationScheduler::new(
            MemorySink::new().with_permission(PermissionState::Denied, PermissionState::Denied),
            MemoryNotifier::granted(),
        );
        let report = scheduler.schedule_alert_batch(&[alert("Food", 9000)]).await;
        assert_eq!(report.skipped, 1);
        assert!(scheduler.sink().pending().is_empty());
    }

    #[tokio::test]
    async fn test_daily_summary_is_idempotent() {
        let scheduler = native();
        scheduler.schedule_daily_summary(20).await.unwrap();
        scheduler.schedule_daily_summary(8).await.unwrap();

        let pending = scheduler.sink().pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, DAILY_SUMMARY_ID);
        assert_eq!(pending[0].recurrence, Recurrence::Daily);

        scheduler.cancel_daily_summary().await.unwrap();
        assert!(scheduler.sink().pending().is_empty());
        assert_eq!(scheduler.sink().cancelled(), vec![DAILY_SUMMARY_ID]);
    }

    #[tokio::test]
    async fn test_daily_summary_rejects_bad_hour() {
        assert!(native().schedule_daily_summary(24).await.unwrap_err().is_validation());
    }

    #[test]
    fn test_next_daily_occurrence() {
        assert_eq!(
            next_daily_occurrence(at(2025, 3, 10, 9, 30), 20).unwrap(),
            at(2025, 3, 10, 20, 0)
        );
        assert_eq!(
            next_daily_occurrence(at(2025, 3, 10, 21, 0), 20).unwrap(),
            at(2025, 3, 11, 20, 0)
        );
        // Exactly on the hour counts as passed
        assert_eq!(
            next_daily_occurrence(at(2025, 12, 31, 20, 0), 20).unwrap(),
            at(2026, 1, 1, 20, 0)
        );
    }

    #[tokio::test]
    async fn test_immediate_ids_avoid_daily_summary() {
        let scheduler = native();
        for _ in 0..20 {
            match scheduler.schedule_immediate("t", "b").await.unwrap() {
                Delivery::Scheduled(id) => {
                    assert!((1000..100_000).contains(&id));
                    assert_ne!(id, DAILY_SUMMARY_ID);
                }
                other => panic!("unexpected delivery {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_immediate_fallback_shows() {
        let scheduler = NotificationScheduler::new(NoNativeSink, MemoryNotifier::granted());
        assert_eq!(
            scheduler.schedule_immediate("Hello", "World").await.unwrap(),
            Delivery::Shown
        );
        assert_eq!(
            scheduler.fallback().shown(),
            vec![("Hello".to_string(), "World".to_string())]
        );
    }

    #[tokio::test]
    async fn test_reminder_native_only() {
        let at = Utc::now() + Duration::hours(3);

        let scheduler = native();
        let delivery = scheduler.schedule_reminder("Pay rent", "Due today", at).await.unwrap();
        assert!(matches!(delivery, Delivery::Scheduled(_)));
        assert_eq!(scheduler.sink().pending()[0].fire_at, at);

        let fallback = NotificationScheduler::new(NoNativeSink, MemoryNotifier::granted());
        assert_eq!(
            fallback.schedule_reminder("Pay rent", "Due today", at).await.unwrap(),
            Delivery::Skipped
        );
        assert!(fallback.fallback().shown().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_sink_uses_fallback() {
        let scheduler =
            NotificationScheduler::new(MemorySink::new().unavailable(), MemoryNotifier::granted());
        assert!(!scheduler.is_native());

        let report = scheduler
            .schedule_alert_batch_at(&[alert("Food", 12000)], Utc::now())
            .await;

        assert_eq!(report.shown, 1);
        assert!(report.scheduled.is_empty());
        assert!(scheduler.sink().pending().is_empty());
    }

    #[tokio::test]
    async fn test_clear_delivered() {
        let scheduler = native();
        scheduler.clear_delivered().await.unwrap();
        assert_eq!(scheduler.sink().clear_count(), 1);

        let fallback = NotificationScheduler::new(NoNativeSink, MemoryNotifier::granted());
        fallback.clear_delivered().await.unwrap();
    }

    #[test]
    fn test_alert_kind_in_payload_matches_display() {
        assert_eq!(AlertKind::Exceeded.to_string(), "exceeded");
    }
}

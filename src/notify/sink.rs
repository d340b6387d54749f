//! Notification delivery targets
//!
//! A [`NotificationSink`] is a platform scheduler that can hold notifications
//! until their fire time, replace them by id and cancel them. An
//! [`InstantNotifier`] can only show something right now; it is the fallback
//! when no native sink exists.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use tracing::info;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{PermissionState, ScheduledNotification};

/// Native scheduling capability
#[allow(async_fn_in_trait)]
pub trait NotificationSink {
    /// Whether this platform can schedule at all
    fn is_available(&self) -> bool;

    async fn check_permission(&self) -> LedgerResult<PermissionState>;

    async fn request_permission(&self) -> LedgerResult<PermissionState>;

    /// Schedule one notification, replacing any pending one with the same id
    async fn schedule(&self, notification: ScheduledNotification) -> LedgerResult<()>;

    /// Cancel pending notifications; unknown ids are ignored
    async fn cancel(&self, ids: &[i32]) -> LedgerResult<()>;

    /// Remove already-delivered notifications from the tray
    async fn clear_delivered(&self) -> LedgerResult<()>;
}

/// Show-it-now fallback notifier
#[allow(async_fn_in_trait)]
pub trait InstantNotifier {
    fn permission(&self) -> PermissionState;

    async fn request_permission(&self) -> PermissionState;

    fn show(&self, title: &str, body: &str) -> LedgerResult<()>;
}

/// Sink for platforms without native scheduling
#[derive(Debug, Default, Clone, Copy)]
pub struct NoNativeSink;

fn unsupported() -> LedgerError {
    LedgerError::Notification("Native notifications are not available".into())
}

impl NotificationSink for NoNativeSink {
    fn is_available(&self) -> bool {
        false
    }

    async fn check_permission(&self) -> LedgerResult<PermissionState> {
        Err(unsupported())
    }

    async fn request_permission(&self) -> LedgerResult<PermissionState> {
        Err(unsupported())
    }

    async fn schedule(&self, _notification: ScheduledNotification) -> LedgerResult<()> {
        Err(unsupported())
    }

    async fn cancel(&self, _ids: &[i32]) -> LedgerResult<()> {
        Err(unsupported())
    }

    async fn clear_delivered(&self) -> LedgerResult<()> {
        Err(unsupported())
    }
}

/// Prints notifications to stderr; always permitted
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl InstantNotifier for ConsoleNotifier {
    fn permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    async fn request_permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    fn show(&self, title: &str, body: &str) -> LedgerResult<()> {
        eprintln!("[{}] {}", title, body);
        Ok(())
    }
}

fn lock_poisoned(e: impl std::fmt::Display) -> LedgerError {
    LedgerError::Notification(format!("Failed to acquire lock: {}", e))
}

#[derive(Debug, Default)]
struct SinkState {
    pending: BTreeMap<i32, ScheduledNotification>,
    cancelled: Vec<i32>,
    clears: usize,
}

/// In-process sink that records what it was asked to do
#[derive(Debug)]
pub struct MemorySink {
    available: bool,
    permission: Mutex<PermissionState>,
    on_request: PermissionState,
    failing_ids: HashSet<i32>,
    state: Mutex<SinkState>,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self {
            available: true,
            permission: Mutex::new(PermissionState::Granted),
            on_request: PermissionState::Granted,
            failing_ids: HashSet::new(),
            state: Mutex::new(SinkState::default()),
        }
    }
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start in `current`; a permission request moves it to `on_request`
    pub fn with_permission(mut self, current: PermissionState, on_request: PermissionState) -> Self {
        self.permission = Mutex::new(current);
        self.on_request = on_request;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Make `schedule` fail for one id
    pub fn failing_on(mut self, id: i32) -> Self {
        self.failing_ids.insert(id);
        self
    }

    /// Pending notifications ordered by id
    pub fn pending(&self) -> Vec<ScheduledNotification> {
        self.state
            .lock()
            .map(|s| s.pending.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn cancelled(&self) -> Vec<i32> {
        self.state
            .lock()
            .map(|s| s.cancelled.clone())
            .unwrap_or_default()
    }

    pub fn clear_count(&self) -> usize {
        self.state.lock().map(|s| s.clears).unwrap_or_default()
    }
}

impl NotificationSink for MemorySink {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn check_permission(&self) -> LedgerResult<PermissionState> {
        Ok(*self.permission.lock().map_err(lock_poisoned)?)
    }

    async fn request_permission(&self) -> LedgerResult<PermissionState> {
        let mut permission = self.permission.lock().map_err(lock_poisoned)?;
        if *permission == PermissionState::Undetermined {
            *permission = self.on_request;
        }
        Ok(*permission)
    }

    async fn schedule(&self, notification: ScheduledNotification) -> LedgerResult<()> {
        if self.failing_ids.contains(&notification.id) {
            return Err(LedgerError::Notification(format!(
                "Sink rejected notification {}",
                notification.id
            )));
        }
        let mut state = self.state.lock().map_err(lock_poisoned)?;
        state.pending.insert(notification.id, notification);
        Ok(())
    }

    async fn cancel(&self, ids: &[i32]) -> LedgerResult<()> {
        let mut state = self.state.lock().map_err(lock_poisoned)?;
        for id in ids {
            state.pending.remove(id);
            state.cancelled.push(*id);
        }
        Ok(())
    }

    async fn clear_delivered(&self) -> LedgerResult<()> {
        let mut state = self.state.lock().map_err(lock_poisoned)?;
        state.clears += 1;
        Ok(())
    }
}

/// Fallback notifier that keeps what it showed
#[derive(Debug)]
pub struct MemoryNotifier {
    permission: Mutex<PermissionState>,
    on_request: PermissionState,
    shown: Mutex<Vec<(String, String)>>,
}

impl MemoryNotifier {
    pub fn new(current: PermissionState, on_request: PermissionState) -> Self {
        Self {
            permission: Mutex::new(current),
            on_request,
            shown: Mutex::new(Vec::new()),
        }
    }

    pub fn granted() -> Self {
        Self::new(PermissionState::Granted, PermissionState::Granted)
    }

    /// `(title, body)` pairs in the order shown
    pub fn shown(&self) -> Vec<(String, String)> {
        self.shown.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl InstantNotifier for MemoryNotifier {
    fn permission(&self) -> PermissionState {
        self.permission
            .lock()
            .map(|p| *p)
            .unwrap_or(PermissionState::Denied)
    }

    async fn request_permission(&self) -> PermissionState {
        match self.permission.lock() {
            Ok(mut permission) => {
                if *permission == PermissionState::Undetermined {
                    *permission = self.on_request;
                    info!(outcome = ?*permission, "fallback notification permission requested");
                }
                *permission
            }
            Err(_) => PermissionState::Denied,
        }
    }

    fn show(&self, title: &str, body: &str) -> LedgerResult<()> {
        self.shown
            .lock()
            .map_err(lock_poisoned)?
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_memory_sink_replaces_by_id() {
        let sink = MemorySink::new();
        let now = Utc::now();

        sink.schedule(ScheduledNotification::new(7, "a", "first", now))
            .await
            .unwrap();
        sink.schedule(ScheduledNotification::new(7, "a", "second", now))
            .await
            .unwrap();

        let pending = sink.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].body, "second");

        sink.cancel(&[7, 8]).await.unwrap();
        assert!(sink.pending().is_empty());
        assert_eq!(sink.cancelled(), vec![7, 8]);
    }

    #[tokio::test]
    async fn test_memory_sink_permission_request() {
        let sink = MemorySink::new()
            .with_permission(PermissionState::Undetermined, PermissionState::Denied);

        assert_eq!(
            sink.check_permission().await.unwrap(),
            PermissionState::Undetermined
        );
        assert_eq!(
            sink.request_permission().await.unwrap(),
            PermissionState::Denied
        );
        assert_eq!(
            sink.check_permission().await.unwrap(),
            PermissionState::Denied
        );
    }

    #[tokio::test]
    async fn test_no_native_sink_refuses_everything() {
        let sink = NoNativeSink;
        assert!(!sink.is_available());
        assert!(sink.check_permission().await.is_err());
        assert!(sink.clear_delivered().await.is_err());
    }

    #[tokio::test]
    async fn test_memory_notifier_only_asks_once() {
        let notifier =
            MemoryNotifier::new(PermissionState::Undetermined, PermissionState::Granted);
        assert_eq!(notifier.request_permission().await, PermissionState::Granted);

        notifier.show("t", "b").unwrap();
        assert_eq!(notifier.shown(), vec![("t".to_string(), "b".to_string())]);
    }
}

//! Notifications for budget alerts, reminders and the daily summary

pub mod monitor;
pub mod scheduler;
pub mod sink;

pub use monitor::{BudgetMonitor, MonitorOutcome};
pub use scheduler::{
    batch_base_id, next_daily_occurrence, BatchReport, Delivery, NotificationScheduler,
    DAILY_SUMMARY_ID,
};
pub use sink::{
    ConsoleNotifier, InstantNotifier, MemoryNotifier, MemorySink, NoNativeSink, NotificationSink,
};

//! Notification CLI commands
//!
//! The terminal has no native scheduler, so the scheduler built here always
//! takes the fallback path: immediate messages print to stderr and
//! time-based notifications report that they were skipped.

use chrono::{Duration, Local, NaiveDateTime, TimeZone, Utc};
use clap::Subcommand;
use serde_json::json;

use super::print_json;
use crate::config::Settings;
use crate::error::{LedgerError, LedgerResult};
use crate::notify::{ConsoleNotifier, NoNativeSink, NotificationScheduler};
use crate::services::PreferencesService;
use crate::storage::Storage;

pub type CliScheduler = NotificationScheduler<NoNativeSink, ConsoleNotifier>;

/// Scheduler used by every CLI command
pub fn cli_scheduler(settings: &Settings) -> CliScheduler {
    let spacing_ms = i64::try_from(settings.alert_spacing_ms).unwrap_or(i64::MAX);
    NotificationScheduler::new(NoNativeSink, ConsoleNotifier)
        .with_spacing(Duration::milliseconds(spacing_ms))
}

/// Notification subcommands
#[derive(Subcommand)]
pub enum NotifyCommands {
    /// Send a test notification
    Test {
        #[arg(short, long, default_value = "pocket-ledger")]
        title: String,
        #[arg(short, long, default_value = "Notifications are working")]
        body: String,
    },

    /// Enable the daily summary at an hour of the day
    Daily {
        /// Hour (0-23), defaults to the configured hour
        #[arg(long)]
        hour: Option<u32>,
    },

    /// Disable the daily summary
    CancelDaily,

    /// Schedule a one-off reminder
    Reminder {
        title: String,
        body: String,
        /// Local time, "YYYY-MM-DD HH:MM"
        #[arg(long)]
        at: String,
    },

    /// Show the notification permission state
    Permission,

    /// Clear delivered notifications
    Clear,
}

fn parse_local_datetime(s: &str) -> LedgerResult<chrono::DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M").map_err(|_| {
        LedgerError::Validation(format!("Invalid time '{}': expected YYYY-MM-DD HH:MM", s))
    })?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| LedgerError::Validation(format!("'{}' does not exist in local time", s)))
}

/// Handle a notification command
pub async fn handle_notify_command(
    storage: &Storage,
    settings: &Settings,
    cmd: NotifyCommands,
) -> LedgerResult<()> {
    let scheduler = cli_scheduler(settings);
    let preferences = PreferencesService::new(storage, settings.user_id.as_str());

    match cmd {
        NotifyCommands::Test { title, body } => {
            let delivery = scheduler.schedule_immediate(&title, &body).await?;
            print_json(&delivery)
        }

        NotifyCommands::Daily { hour } => {
            let hour = hour.unwrap_or(settings.daily_summary_hour);
            let delivery = scheduler.schedule_daily_summary(hour).await?;
            preferences
                .update(|c| c.notifications.daily_summary = true)
                .await?;
            print_json(&json!({ "hour": hour, "delivery": delivery }))
        }

        NotifyCommands::CancelDaily => {
            scheduler.cancel_daily_summary().await?;
            preferences
                .update(|c| c.notifications.daily_summary = false)
                .await?;
            print_json(&json!({ "daily_summary": false }))
        }

        NotifyCommands::Reminder { title, body, at } => {
            if !preferences.get().await.notifications.reminders {
                return print_json(&json!({ "delivery": "disabled" }));
            }
            let at = parse_local_datetime(&at)?;
            print_json(&scheduler.schedule_reminder(&title, &body, at).await?)
        }

        NotifyCommands::Permission => {
            print_json(&json!({
                "native": scheduler.is_native(),
                "permission": scheduler.permission_state().await,
            }))
        }

        NotifyCommands::Clear => {
            scheduler.clear_delivered().await?;
            print_json(&json!({ "cleared": true }))
        }
    }
}

//! Scheduled notification intents handed to a notification sink

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Repeat policy of a scheduled notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
}

/// Tri-state notification permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    Undetermined,
}

impl PermissionState {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// A notification to deliver at `fire_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledNotification {
    /// Sink-level id; must fit a signed 32-bit integer
    pub id: i32,
    pub title: String,
    pub body: String,
    pub fire_at: DateTime<Utc>,
    #[serde(default)]
    pub recurrence: Recurrence,

    /// Opaque data for whoever handles a tap on the notification
    #[serde(default)]
    pub payload: BTreeMap<String, String>,
}

impl ScheduledNotification {
    pub fn new(
        id: i32,
        title: impl Into<String>,
        body: impl Into<String>,
        fire_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            body: body.into(),
            fire_at,
            recurrence: Recurrence::None,
            payload: BTreeMap::new(),
        }
    }

    pub fn recurring(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = recurrence;
        self
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }
}

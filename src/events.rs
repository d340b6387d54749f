//! Change notifications for stored records
//!
//! Repositories publish a [`StoreEvent`] after every successful mutation.
//! Anything that needs to react to changes (refreshing a cached list,
//! re-checking budget alerts) subscribes to an [`EventBus`] explicitly
//! instead of observing shared state.
//!
//! Delivery is best effort: a bus with no subscribers drops events, and a
//! subscriber that falls more than the channel capacity behind sees
//! `RecvError::Lagged` and skips ahead.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use crate::models::EntityType;

const DEFAULT_CAPACITY: usize = 256;

/// What happened to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Update,
    Delete,
    /// Every record of the entity type was removed
    Clear,
}

/// A single change to the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEvent {
    pub entity: EntityType,
    pub operation: Operation,

    /// Record id; `None` for [`Operation::Clear`]
    pub id: Option<String>,
}

impl StoreEvent {
    pub fn new(entity: EntityType, operation: Operation, id: impl Into<String>) -> Self {
        Self {
            entity,
            operation,
            id: Some(id.into()),
        }
    }

    pub fn cleared(entity: EntityType) -> Self {
        Self {
            entity,
            operation: Operation::Clear,
            id: None,
        }
    }
}

/// Fan-out channel for [`StoreEvent`]s; cheap to clone
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event; returns how many subscribers will see it
    pub fn publish(&self, event: StoreEvent) -> usize {
        trace!(?event, "publishing store event");
        // An error only means nobody is listening right now
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

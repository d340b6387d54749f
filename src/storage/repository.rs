//! Generic record repository over the key-value store
//!
//! One repository per record kind. Each record lives under `prefix + id`, so
//! listing is a prefix scan and clearing is a prefix delete.

use std::marker::PhantomData;

use chrono::Utc;
use tracing::{debug, info};

use super::kv::KeyValueStore;
use crate::error::LedgerResult;
use crate::events::{EventBus, Operation, StoreEvent};
use crate::models::{generate_id, Record};

/// CRUD for one record kind
pub struct RecordRepository<T: Record> {
    store: KeyValueStore,
    prefix: String,
    events: EventBus,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Clone for RecordRepository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            prefix: self.prefix.clone(),
            events: self.events.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Record> RecordRepository<T> {
    /// Repository under the record's own prefix
    pub fn new(store: KeyValueStore, events: EventBus) -> Self {
        Self::with_prefix(store, events, T::PREFIX)
    }

    /// Repository under a custom prefix
    pub fn with_prefix(store: KeyValueStore, events: EventBus, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            events,
            _record: PhantomData,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key(&self, id: &str) -> String {
        format!("{}{}", self.prefix, id)
    }

    /// Store a new record with a fresh id
    pub async fn create(&self, draft: T::Draft) -> LedgerResult<T> {
        let record = T::from_draft(generate_id(), draft, Utc::now());
        record.validate()?;

        self.store
            .set_as(&self.key(record.id()), &record)
            .await?;

        debug!(entity = %T::ENTITY, id = record.id(), "created record");
        self.events
            .publish(StoreEvent::new(T::ENTITY, Operation::Create, record.id()));
        Ok(record)
    }

    /// Fetch a record; `None` when missing or unreadable
    pub async fn read(&self, id: &str) -> Option<T> {
        self.store.get_as(&self.key(id)).await
    }

    /// Every record under the prefix, unordered
    pub async fn list(&self) -> Vec<T> {
        self.store.get_all_by_prefix_as(&self.prefix).await
    }

    /// Merge a patch into an existing record
    ///
    /// Returns `Ok(None)` when the id does not exist. Id and creation time are
    /// kept, the modification time is set to now.
    pub async fn update(&self, id: &str, patch: T::Patch) -> LedgerResult<Option<T>> {
        let Some(mut record) = self.read(id).await else {
            debug!(entity = %T::ENTITY, id, "update of missing record ignored");
            return Ok(None);
        };

        record.apply_patch(patch);
        record.touch(Utc::now());
        record.validate()?;

        self.store.set_as(&self.key(id), &record).await?;

        debug!(entity = %T::ENTITY, id, "updated record");
        self.events
            .publish(StoreEvent::new(T::ENTITY, Operation::Update, id));
        Ok(Some(record))
    }

    /// Remove a record; deleting a missing id succeeds
    pub async fn delete(&self, id: &str) -> LedgerResult<()> {
        self.store.remove(&self.key(id)).await?;

        debug!(entity = %T::ENTITY, id, "deleted record");
        self.events
            .publish(StoreEvent::new(T::ENTITY, Operation::Delete, id));
        Ok(())
    }

    /// Remove every record of this kind; returns how many went
    pub async fn clear_all(&self) -> LedgerResult<usize> {
        let removed = self.store.remove_by_prefix(&self.prefix).await?;

        info!(entity = %T::ENTITY, removed, "cleared records");
        self.events.publish(StoreEvent::cleared(T::ENTITY));
        Ok(removed)
    }

    pub async fn count(&self) -> usize {
        self.list().await.len()
    }
}

//! Storage layer for pocket-ledger
//!
//! A single key-value store holds every record under a per-kind key prefix.
//! [`Storage`] bundles the store, the event bus and one repository per record
//! kind so services can be built from one handle.

pub mod backend;
pub mod file_io;
pub mod init;
pub mod kv;
pub mod repository;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use file_io::{read_json, write_json_atomic, write_string_atomic};
pub use init::initialize_storage;
pub use kv::KeyValueStore;
pub use repository::RecordRepository;

use tracing::{debug, info};

use crate::config::{BackendKind, LedgerPaths, Settings};
use crate::error::LedgerResult;
use crate::events::{EventBus, StoreEvent};
use crate::models::{Budget, EntityType, Expense, Income};

/// Main storage coordinator that provides access to all repositories
#[derive(Clone)]
pub struct Storage {
    store: KeyValueStore,
    events: EventBus,
    pub expenses: RecordRepository<Expense>,
    pub incomes: RecordRepository<Income>,
    pub budgets: RecordRepository<Budget>,
}

impl Storage {
    /// Build repositories over an existing store handle
    pub fn new(store: KeyValueStore) -> Self {
        let events = EventBus::new();
        Self {
            expenses: RecordRepository::new(store.clone(), events.clone()),
            incomes: RecordRepository::new(store.clone(), events.clone()),
            budgets: RecordRepository::new(store.clone(), events.clone()),
            store,
            events,
        }
    }

    /// Storage backed by the configured backend. Nothing is opened yet.
    pub fn open(paths: &LedgerPaths, settings: &Settings) -> LedgerResult<Self> {
        let store = match settings.backend {
            BackendKind::File => {
                paths.ensure_directories()?;
                debug!(path = %paths.store_file().display(), "using file backend");
                KeyValueStore::file(paths.store_file())
            }
            BackendKind::Memory => {
                debug!("using memory backend");
                KeyValueStore::in_memory()
            }
        };
        Ok(Self::new(store))
    }

    pub fn in_memory() -> Self {
        Self::new(KeyValueStore::in_memory())
    }

    pub fn store(&self) -> &KeyValueStore {
        &self.store
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Open the backend and seed defaults
    pub async fn initialize(&self) -> LedgerResult<()> {
        initialize_storage(&self.store).await?;
        Ok(())
    }

    /// Wipe the whole store, announce the clear for every kind and re-seed
    /// the default category lists
    pub async fn reset(&self) -> LedgerResult<()> {
        self.store.clear().await?;
        for entity in [
            EntityType::Expense,
            EntityType::Income,
            EntityType::Budget,
            EntityType::ExpenseCategory,
            EntityType::IncomeSource,
            EntityType::UserConfig,
        ] {
            self.events.publish(StoreEvent::cleared(entity));
        }
        let seeded = initialize_storage(&self.store).await?;
        info!(seeded, "storage reset");
        Ok(())
    }
}

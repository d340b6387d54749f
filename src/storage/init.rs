//! Storage initialization
//!
//! Handles first-run setup: the category and income source lists are seeded
//! with defaults whenever they are missing or empty.

use tracing::info;

use super::kv::KeyValueStore;
use crate::error::LedgerResult;
use crate::models::{CategoryDefinition, CategoryList};

/// Open the store and seed default definition lists
///
/// Returns how many lists were written.
pub async fn initialize_storage(store: &KeyValueStore) -> LedgerResult<usize> {
    store.init().await?;

    let mut seeded = 0;
    for list in [CategoryList::Expense, CategoryList::IncomeSource] {
        if needs_defaults(store, list).await {
            store.set_as(list.key(), &list.defaults()).await?;
            info!(key = list.key(), "seeded default definitions");
            seeded += 1;
        }
    }

    Ok(seeded)
}

async fn needs_defaults(store: &KeyValueStore, list: CategoryList) -> bool {
    store
        .get_as::<Vec<CategoryDefinition>>(list.key())
        .await
        .map_or(true, |existing| existing.is_empty())
}

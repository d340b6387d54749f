//! Category service
//!
//! Manages the expense category and income source lists. Each list is one
//! store entry; records refer to definitions by name.

use tracing::info;

use crate::error::{LedgerError, LedgerResult};
use crate::events::{Operation, StoreEvent};
use crate::models::{generate_id, CategoryDefinition, CategoryList, EntityType};
use crate::storage::Storage;

/// Service for category and income source definitions
pub struct CategoryService<'a> {
    storage: &'a Storage,
    list: CategoryList,
}

impl<'a> CategoryService<'a> {
    pub fn new(storage: &'a Storage, list: CategoryList) -> Self {
        Self { storage, list }
    }

    pub fn expense_categories(storage: &'a Storage) -> Self {
        Self::new(storage, CategoryList::Expense)
    }

    pub fn income_sources(storage: &'a Storage) -> Self {
        Self::new(storage, CategoryList::IncomeSource)
    }

    fn entity(&self) -> EntityType {
        match self.list {
            CategoryList::Expense => EntityType::ExpenseCategory,
            CategoryList::IncomeSource => EntityType::IncomeSource,
        }
    }

    /// The stored list, or the defaults when nothing usable is stored
    pub async fn list(&self) -> Vec<CategoryDefinition> {
        match self
            .storage
            .store()
            .get_as::<Vec<CategoryDefinition>>(self.list.key())
            .await
        {
            Some(definitions) if !definitions.is_empty() => definitions,
            _ => self.list.defaults(),
        }
    }

    /// Find a definition by id, or by name (case-insensitive)
    pub async fn find(&self, identifier: &str) -> Option<CategoryDefinition> {
        let definitions = self.list().await;
        definitions
            .iter()
            .find(|d| d.id == identifier)
            .or_else(|| {
                definitions
                    .iter()
                    .find(|d| d.name.eq_ignore_ascii_case(identifier))
            })
            .cloned()
    }

    async fn save(&self, definitions: &[CategoryDefinition]) -> LedgerResult<()> {
        self.storage
            .store()
            .set_as(self.list.key(), &definitions)
            .await
    }

    /// Append a definition with a generated id
    pub async fn add(&self, name: &str, icon: &str, color: &str) -> LedgerResult<CategoryDefinition> {
        let definition = CategoryDefinition::new(generate_id(), name.trim(), icon, color);
        definition
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        let mut definitions = self.list().await;
        if definitions
            .iter()
            .any(|d| d.name.eq_ignore_ascii_case(&definition.name))
        {
            return Err(LedgerError::Duplicate {
                entity_type: self.entity().as_str(),
                identifier: definition.name,
            });
        }

        definitions.push(definition.clone());
        self.save(&definitions).await?;

        info!(key = self.list.key(), name = %definition.name, "added definition");
        self.storage.events().publish(StoreEvent::new(
            self.entity(),
            Operation::Create,
            definition.id.clone(),
        ));
        Ok(definition)
    }

    /// Remove a definition by id or name
    pub async fn remove(&self, identifier: &str) -> LedgerResult<CategoryDefinition> {
        let removed = self
            .find(identifier)
            .await
            .ok_or_else(|| LedgerError::not_found(self.entity().as_str(), identifier))?;

        let remaining: Vec<_> = self
            .list()
            .await
            .into_iter()
            .filter(|d| d.id != removed.id)
            .collect();
        self.save(&remaining).await?;

        info!(key = self.list.key(), name = %removed.name, "removed definition");
        self.storage.events().publish(StoreEvent::new(
            self.entity(),
            Operation::Delete,
            removed.id.clone(),
        ));
        Ok(removed)
    }
}

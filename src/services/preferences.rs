//! Per-user preferences stored under `user_config_<userId>`

use tracing::debug;

use crate::error::LedgerResult;
use crate::events::{Operation, StoreEvent};
use crate::models::{EntityType, UserConfig};
use crate::storage::Storage;

pub struct PreferencesService<'a> {
    storage: &'a Storage,
    user_id: String,
}

impl<'a> PreferencesService<'a> {
    pub fn new(storage: &'a Storage, user_id: impl Into<String>) -> Self {
        Self {
            storage,
            user_id: user_id.into(),
        }
    }

    /// Stored preferences, or the defaults when none are stored
    pub async fn get(&self) -> UserConfig {
        self.storage
            .store()
            .get_as(&UserConfig::key_for(&self.user_id))
            .await
            .unwrap_or_default()
    }

    pub async fn save(&self, config: &UserConfig) -> LedgerResult<()> {
        self.storage
            .store()
            .set_as(&UserConfig::key_for(&self.user_id), config)
            .await?;

        debug!(user_id = %self.user_id, "saved preferences");
        self.storage.events().publish(StoreEvent::new(
            EntityType::UserConfig,
            Operation::Update,
            self.user_id.clone(),
        ));
        Ok(())
    }

    /// Load, modify and save in one step
    pub async fn update(&self, change: impl FnOnce(&mut UserConfig)) -> LedgerResult<UserConfig> {
        let mut config = self.get().await;
        change(&mut config);
        self.save(&config).await?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults_when_absent() {
        let storage = Storage::in_memory();
        let config = PreferencesService::new(&storage, "local").get().await;
        assert_eq!(config, UserConfig::default());
    }

    #[tokio::test]
    async fn test_update_is_per_user() {
        let storage = Storage::in_memory();
        let alice = PreferencesService::new(&storage, "alice");

        alice
            .update(|c| c.notifications.budgets = false)
            .await
            .unwrap();

        assert!(!alice.get().await.notifications.budgets);
        assert!(PreferencesService::new(&storage, "bob")
            .get()
            .await
            .notifications
            .budgets);
        assert!(storage.store().get("user_config_alice").await.is_some());
    }
}

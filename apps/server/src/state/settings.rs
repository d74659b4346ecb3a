//! # Settings State
//!
//! Store settings loaded once at startup and shared by every handler.
//! Writes go to the database first and then replace the cached copy, so
//! the cache never holds values the database rejected.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use minimarket_core::{SettingsPatch, StoreSettings};
use minimarket_db::{Database, DbResult};

#[derive(Debug, Clone)]
pub struct SettingsState {
    inner: Arc<RwLock<StoreSettings>>,
}

impl SettingsState {
    pub fn new(settings: StoreSettings) -> Self {
        SettingsState {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    pub async fn load(db: &Database) -> DbResult<Self> {
        let settings = db.settings().load().await?;
        info!(store_name = %settings.store_name, "Store settings loaded");
        Ok(Self::new(settings))
    }

    /// A copy of the current settings.
    pub async fn get(&self) -> StoreSettings {
        self.inner.read().await.clone()
    }

    /// Re-reads settings from the database.
    pub async fn refresh(&self, db: &Database) -> DbResult<StoreSettings> {
        let fresh = db.settings().load().await?;
        *self.inner.write().await = fresh.clone();
        Ok(fresh)
    }

    /// Merges `patch` onto the cached settings and persists the result.
    ///
    /// The write lock is held across the save so concurrent patches apply
    /// one after the other.
    pub async fn patch(&self, db: &Database, patch: SettingsPatch) -> DbResult<StoreSettings> {
        let mut cached = self.inner.write().await;
        let merged = patch.apply_to(cached.clone());
        let saved = db.settings().save(&merged).await?;
        *cached = saved.clone();
        Ok(saved)
    }

    pub async fn format_currency(&self, cents: i64) -> String {
        self.inner.read().await.format_currency(cents)
    }

    pub async fn low_stock_threshold(&self) -> i64 {
        self.inner.read().await.low_stock_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minimarket_db::DbConfig;

    #[tokio::test]
    async fn test_patch_then_refresh() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = SettingsState::load(&db).await.unwrap();
        assert_eq!(state.format_currency(1234).await, "$12.34");

        let patch = SettingsPatch {
            currency_symbol: Some("€".to_string()),
            ..SettingsPatch::default()
        };
        state.patch(&db, patch).await.unwrap();
        assert_eq!(state.format_currency(1234).await, "€12.34");

        // Another writer changes the row behind our back.
        let mut external = db.settings().load().await.unwrap();
        external.low_stock_threshold = 9;
        db.settings().save(&external).await.unwrap();
        assert_eq!(state.low_stock_threshold().await, 5);

        state.refresh(&db).await.unwrap();
        assert_eq!(state.low_stock_threshold().await, 9);
    }

    #[tokio::test]
    async fn test_patch_keeps_omitted_keys() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = SettingsState::load(&db).await.unwrap();

        state
            .patch(
                &db,
                SettingsPatch {
                    currency_symbol: Some("€".to_string()),
                    ..SettingsPatch::default()
                },
            )
            .await
            .unwrap();
        let saved = state
            .patch(
                &db,
                SettingsPatch {
                    store_name: Some("Corner Shop".to_string()),
                    ..SettingsPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(saved.store_name, "Corner Shop");
        assert_eq!(saved.currency_symbol, "€");
        assert_eq!(db.settings().load().await.unwrap(), saved);
    }

    #[tokio::test]
    async fn test_rejected_update_keeps_cache() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = SettingsState::load(&db).await.unwrap();

        let bad = SettingsPatch {
            store_name: Some(String::new()),
            ..SettingsPatch::default()
        };
        assert!(state.patch(&db, bad).await.is_err());
        assert_eq!(state.get().await.store_name, "Mini Market");
    }
}

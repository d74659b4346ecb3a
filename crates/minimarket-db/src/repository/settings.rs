//! # Settings Repository
//!
//! Store settings as `settings(key, value)` rows. The server loads them
//! once into its settings state and writes through here on change.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;
use minimarket_core::StoreSettings;

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Loads settings, falling back to defaults for missing keys.
    pub async fn load(&self) -> DbResult<StoreSettings> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await?;

        debug!(keys = rows.len(), "Loaded settings rows");
        Ok(StoreSettings::from_pairs(rows))
    }

    /// Validates and writes every setting in one transaction.
    pub async fn save(&self, settings: &StoreSettings) -> DbResult<StoreSettings> {
        settings.validate()?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        for (key, value) in settings.to_pairs() {
            sqlx::query(
                r#"
                INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
                ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                "#,
            )
            .bind(key)
            .bind(value)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(store_name = %settings.store_name, "Settings saved");

        Ok(settings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_defaults_come_from_migration() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let settings = db.settings().load().await.unwrap();

        assert_eq!(settings, StoreSettings::default());
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.settings();

        let changed = StoreSettings {
            store_name: "Corner Shop".to_string(),
            low_stock_threshold: 10,
            ..StoreSettings::default()
        };
        repo.save(&changed).await.unwrap();

        assert_eq!(repo.load().await.unwrap(), changed);
    }

    #[tokio::test]
    async fn test_invalid_settings_not_saved() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.settings();

        let bad = StoreSettings {
            low_stock_threshold: -1,
            ..StoreSettings::default()
        };
        assert!(repo.save(&bad).await.is_err());
        assert_eq!(repo.load().await.unwrap().low_stock_threshold, 5);
    }
}

//! # Backup Repository
//!
//! Whole-database JSON snapshots and restore.
//!
//! ## Restore Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    DELETE  sale_items → sales → expenses → products → profiles →       │
//! │            settings                       (children before parents)    │
//! │    INSERT  settings → profiles → products → sales → sale_items →       │
//! │            expenses                       (parents before children)    │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A snapshot that fails to insert (bad foreign key, duplicate barcode)
//! leaves the current data untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use super::checkout::{insert_item, insert_sale};
use super::sale::{ITEM_COLUMNS, SALE_COLUMNS};
use crate::error::{DbError, DbResult};
use minimarket_core::validation::{validate_price_cents, validate_stock};
use minimarket_core::{Expense, Product, Role, Sale, SaleItem};

/// Bumped whenever the snapshot layout changes.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A profile row including its password hash, so restored staff can sign in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SettingRecord {
    pub key: String,
    pub value: String,
}

/// Every table, as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub settings: Vec<SettingRecord>,
    pub profiles: Vec<ProfileRecord>,
    pub products: Vec<Product>,
    pub sales: Vec<Sale>,
    pub sale_items: Vec<SaleItem>,
    pub expenses: Vec<Expense>,
}

/// Row counts after a restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreSummary {
    pub profiles: usize,
    pub products: usize,
    pub sales: usize,
    pub sale_items: usize,
    pub expenses: usize,
}

impl Snapshot {
    pub fn to_json(&self) -> DbResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> DbResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone)]
pub struct BackupRepository {
    pool: SqlitePool,
}

impl BackupRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BackupRepository { pool }
    }

    /// Reads every table in one read transaction so the snapshot is
    /// consistent even while a checkout is running.
    pub async fn snapshot(&self) -> DbResult<Snapshot> {
        debug!("Taking database snapshot");

        let mut tx = self.pool.begin().await?;

        let settings = sqlx::query_as::<_, SettingRecord>("SELECT key, value FROM settings ORDER BY key")
            .fetch_all(&mut *tx)
            .await?;

        let profiles = sqlx::query_as::<_, ProfileRecord>(
            "SELECT id, full_name, email, role, password_hash, is_active, created_at \
             FROM profiles ORDER BY created_at, id",
        )
        .fetch_all(&mut *tx)
        .await?;

        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, barcode, category, price_cents, stock, is_active, created_at, updated_at \
             FROM products ORDER BY created_at, id",
        )
        .fetch_all(&mut *tx)
        .await?;

        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at, id"
        ))
        .fetch_all(&mut *tx)
        .await?;

        let sale_items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items ORDER BY sale_id, created_at, rowid"
        ))
        .fetch_all(&mut *tx)
        .await?;

        let expenses = sqlx::query_as::<_, Expense>(
            "SELECT id, description, category, amount_cents, created_at \
             FROM expenses ORDER BY created_at, id",
        )
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            products = products.len(),
            sales = sales.len(),
            expenses = expenses.len(),
            "Snapshot taken"
        );

        Ok(Snapshot {
            version: SNAPSHOT_VERSION,
            created_at: Utc::now(),
            settings,
            profiles,
            products,
            sales,
            sale_items,
            expenses,
        })
    }

    /// Replaces every table with the snapshot's rows.
    ///
    /// ## Returns
    /// * `Err(DbError::InvalidSnapshot)` - Unknown version or a product price or
    ///   stock out of range; nothing changed
    /// * `Err(DbError::ForeignKeyViolation | UniqueViolation)` - Rows don't fit together; rolled back
    pub async fn restore(&self, snapshot: &Snapshot) -> DbResult<RestoreSummary> {
        if snapshot.version != SNAPSHOT_VERSION {
            warn!(version = snapshot.version, "Rejecting snapshot with unknown version");
            return Err(DbError::InvalidSnapshot(format!(
                "unsupported version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        for product in &snapshot.products {
            validate_price_cents(product.price_cents)
                .and_then(|_| validate_stock(product.stock))
                .map_err(|e| DbError::InvalidSnapshot(format!("product {}: {}", product.id, e)))?;
        }

        info!(
            taken_at = %snapshot.created_at,
            products = snapshot.products.len(),
            sales = snapshot.sales.len(),
            "Restoring snapshot"
        );

        let mut tx = self.pool.begin().await?;

        for table in ["sale_items", "sales", "expenses", "products", "profiles", "settings"] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?;
        }

        for setting in &snapshot.settings {
            sqlx::query("INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)")
                .bind(&setting.key)
                .bind(&setting.value)
                .bind(snapshot.created_at)
                .execute(&mut *tx)
                .await?;
        }
        for profile in &snapshot.profiles {
            insert_profile(&mut *tx, profile).await?;
        }
        for product in &snapshot.products {
            insert_product(&mut *tx, product).await?;
        }
        for sale in &snapshot.sales {
            insert_sale(&mut *tx, sale).await?;
        }
        for item in &snapshot.sale_items {
            insert_item(&mut *tx, item).await?;
        }
        for expense in &snapshot.expenses {
            sqlx::query(
                "INSERT INTO expenses (id, description, category, amount_cents, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&expense.id)
            .bind(&expense.description)
            .bind(&expense.category)
            .bind(expense.amount_cents)
            .bind(expense.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let summary = RestoreSummary {
            profiles: snapshot.profiles.len(),
            products: snapshot.products.len(),
            sales: snapshot.sales.len(),
            sale_items: snapshot.sale_items.len(),
            expenses: snapshot.expenses.len(),
        };
        info!(?summary, "Snapshot restored");

        Ok(summary)
    }
}

async fn insert_profile(conn: &mut SqliteConnection, profile: &ProfileRecord) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO profiles (id, full_name, email, role, password_hash, is_active, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&profile.id)
    .bind(&profile.full_name)
    .bind(&profile.email)
    .bind(profile.role)
    .bind(&profile.password_hash)
    .bind(profile.is_active)
    .bind(profile.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_product(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO products (
            id, name, barcode, category, price_cents, stock, is_active, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.barcode)
    .bind(&product.category)
    .bind(product.price_cents)
    .bind(product.stock)
    .bind(product.is_active)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

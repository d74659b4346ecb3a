//! # Sale Repository
//!
//! Read access to sales history. Every write to `sales` and `sale_items`
//! goes through [`CheckoutRepository`](super::checkout::CheckoutRepository)
//! so stock moves in the same transaction.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  (cart)  ──checkout──►  completed  ──edit / resumed checkout──►  edited │
//! │                             │                                    │      │
//! │                             └──────────── delete ────────────────┘      │
//! │                                  items removed, stock restored          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use minimarket_core::{Sale, SaleDetail, SaleItem};

pub(crate) const SALE_COLUMNS: &str =
    "id, total_cents, payment_method, status, cashier_id, created_at, updated_at";

pub(crate) const ITEM_COLUMNS: &str = "id, sale_id, product_id, name_snapshot, unit_price_cents, \
     quantity, subtotal_cents, created_at";

/// Default page size of the sales list.
pub const DEFAULT_SALES_LIMIT: u32 = 100;

/// Filter for the sales list. Bounds are inclusive `from`, exclusive `to`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub cashier_id: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_sale(&mut *conn, id).await
    }

    /// Lines of a sale in the order they were rung up.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let mut conn = self.pool.acquire().await?;
        fetch_items(&mut *conn, sale_id).await
    }

    /// Sale header plus its lines.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No sale with that id
    pub async fn get_detail(&self, id: &str) -> DbResult<SaleDetail> {
        let mut conn = self.pool.acquire().await?;
        fetch_detail(&mut *conn, id).await
    }

    /// Newest sales first.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<Sale>> {
        let limit = filter.limit.unwrap_or(DEFAULT_SALES_LIMIT);

        debug!(
            from = ?filter.from,
            to = ?filter.to,
            limit = %limit,
            "Listing sales"
        );

        let sql = format!(
            r#"
            SELECT {SALE_COLUMNS}
            FROM sales
            WHERE (?1 IS NULL OR created_at >= ?1)
              AND (?2 IS NULL OR created_at < ?2)
              AND (?3 IS NULL OR cashier_id = ?3)
            ORDER BY created_at DESC
            LIMIT ?4
            "#
        );

        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(filter.from)
            .bind(filter.to)
            .bind(&filter.cashier_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level helpers (shared with checkout transactions)
// =============================================================================

pub(crate) async fn fetch_sale(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");

    let sale = sqlx::query_as::<_, Sale>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(sale)
}

pub(crate) async fn fetch_items(
    conn: &mut SqliteConnection,
    sale_id: &str,
) -> DbResult<Vec<SaleItem>> {
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY created_at, rowid"
    );

    let items = sqlx::query_as::<_, SaleItem>(&sql)
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(items)
}

pub(crate) async fn fetch_detail(conn: &mut SqliteConnection, id: &str) -> DbResult<SaleDetail> {
    let sale = fetch_sale(&mut *conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", id))?;
    let items = fetch_items(&mut *conn, id).await?;

    Ok(SaleDetail { sale, items })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::checkout::insert_sale;
    use chrono::TimeZone;
    use minimarket_core::{PaymentMethod, SaleStatus};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    /// s-1 (c-1, day 1 09:00), s-2 (c-2, day 1 12:00), s-3 (c-1, day 2 09:00).
    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        for (id, email) in [("c-1", "one@example.com"), ("c-2", "two@example.com")] {
            sqlx::query(
                "INSERT INTO profiles (id, full_name, email, role, password_hash, is_active, created_at)
                 VALUES (?1, ?1, ?2, 'cashier', 'x', 1, ?3)",
            )
            .bind(id)
            .bind(email)
            .bind(at(1, 8))
            .execute(&mut *conn)
            .await
            .unwrap();
        }

        for (id, cashier, created_at) in [
            ("s-1", "c-1", at(1, 9)),
            ("s-2", "c-2", at(1, 12)),
            ("s-3", "c-1", at(2, 9)),
        ] {
            let sale = Sale {
                id: id.to_string(),
                total_cents: 100,
                payment_method: PaymentMethod::Cash,
                status: SaleStatus::Completed,
                cashier_id: cashier.to_string(),
                created_at,
                updated_at: created_at,
            };
            insert_sale(&mut *conn, &sale).await.unwrap();
        }

        drop(conn);
        db
    }

    fn ids(sales: &[Sale]) -> Vec<&str> {
        sales.iter().map(|s| s.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_list_newest_first_and_limit() {
        let db = seeded().await;
        let repo = db.sales();

        let all = repo.list(&SaleFilter::default()).await.unwrap();
        assert_eq!(ids(&all), vec!["s-3", "s-2", "s-1"]);

        let page = repo
            .list(&SaleFilter {
                limit: Some(2),
                ..SaleFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&page), vec!["s-3", "s-2"]);
    }

    #[tokio::test]
    async fn test_list_by_cashier() {
        let db = seeded().await;

        let sales = db
            .sales()
            .list(&SaleFilter {
                cashier_id: Some("c-1".to_string()),
                ..SaleFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&sales), vec!["s-3", "s-1"]);

        let none = db
            .sales()
            .list(&SaleFilter {
                cashier_id: Some("nobody".to_string()),
                ..SaleFilter::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_list_from_inclusive_to_exclusive() {
        let db = seeded().await;
        let repo = db.sales();

        let window = repo
            .list(&SaleFilter {
                from: Some(at(1, 12)),
                to: Some(at(2, 9)),
                ..SaleFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&window), vec!["s-2"]);

        let day_one = repo
            .list(&SaleFilter {
                to: Some(at(2, 0)),
                cashier_id: Some("c-1".to_string()),
                ..SaleFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&day_one), vec!["s-1"]);

        let future = repo
            .list(&SaleFilter {
                from: Some(at(20, 0)),
                ..SaleFilter::default()
            })
            .await
            .unwrap();
        assert!(future.is_empty());
    }

    #[tokio::test]
    async fn test_filter_from_query_json() {
        let filter: SaleFilter =
            serde_json::from_str(r#"{"cashierId":"c-2","limit":1}"#).unwrap();
        let db = seeded().await;

        let sales = db.sales().list(&filter).await.unwrap();
        assert_eq!(ids(&sales), vec!["s-2"]);
    }

    #[tokio::test]
    async fn test_missing_sale_detail_is_not_found() {
        let db = seeded().await;

        assert!(matches!(
            db.sales().get_detail("missing").await,
            Err(DbError::NotFound { .. })
        ));
        assert!(db.sales().get_by_id("missing").await.unwrap().is_none());
        assert_eq!(db.sales().count().await.unwrap(), 3);
    }
}

//! # Report Repository
//!
//! Read-only aggregates over sales and expenses for the back office.
//!
//! ```text
//! net = Σ sales.total_cents − Σ expenses.amount_cents   (same date range)
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;
use ts_rs::TS;

use crate::error::DbResult;
use crate::repository::expense::DateRange;

/// Default number of rows in the top products list.
pub const DEFAULT_TOP_PRODUCTS: u32 = 10;

/// Totals for a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SummaryReport {
    #[ts(as = "Option<String>")]
    pub from: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub to: Option<DateTime<Utc>>,
    pub sale_count: i64,
    pub sales_total_cents: i64,
    pub items_sold: i64,
    pub expense_total_cents: i64,
    pub net_cents: i64,
}

/// One row of the best sellers list, ranked by quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TopProduct {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    pub async fn summary(&self, range: DateRange) -> DbResult<SummaryReport> {
        debug!(from = ?range.from, to = ?range.to, "Building summary report");

        let (sale_count, sales_total_cents): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(total_cents), 0)
            FROM sales
            WHERE (?1 IS NULL OR created_at >= ?1)
              AND (?2 IS NULL OR created_at < ?2)
            "#,
        )
        .bind(range.from)
        .bind(range.to)
        .fetch_one(&self.pool)
        .await?;

        let items_sold: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(si.quantity), 0)
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE (?1 IS NULL OR s.created_at >= ?1)
              AND (?2 IS NULL OR s.created_at < ?2)
            "#,
        )
        .bind(range.from)
        .bind(range.to)
        .fetch_one(&self.pool)
        .await?;

        let expense_total_cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0)
            FROM expenses
            WHERE (?1 IS NULL OR created_at >= ?1)
              AND (?2 IS NULL OR created_at < ?2)
            "#,
        )
        .bind(range.from)
        .bind(range.to)
        .fetch_one(&self.pool)
        .await?;

        Ok(SummaryReport {
            from: range.from,
            to: range.to,
            sale_count,
            sales_total_cents,
            items_sold,
            expense_total_cents,
            net_cents: sales_total_cents - expense_total_cents,
        })
    }

    /// Best sellers by units sold. Names come from the newest snapshot so a
    /// renamed product shows its current label.
    pub async fn top_products(&self, range: DateRange, limit: u32) -> DbResult<Vec<TopProduct>> {
        let rows = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT si.product_id AS product_id,
                   COALESCE(p.name, MAX(si.name_snapshot)) AS name,
                   SUM(si.quantity) AS quantity,
                   SUM(si.subtotal_cents) AS revenue_cents
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            LEFT JOIN products p ON p.id = si.product_id
            WHERE (?1 IS NULL OR s.created_at >= ?1)
              AND (?2 IS NULL OR s.created_at < ?2)
            GROUP BY si.product_id
            ORDER BY quantity DESC, revenue_cents DESC
            LIMIT ?3
            "#,
        )
        .bind(range.from)
        .bind(range.to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

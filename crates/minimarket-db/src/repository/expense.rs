//! # Expense Repository
//!
//! Money paid out of the till. Reports subtract these from sales.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use minimarket_core::validation::{
    validate_amount_cents, validate_expense_description, ValidationResult,
};
use minimarket_core::Expense;

const EXPENSE_COLUMNS: &str = "id, description, category, amount_cents, created_at";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    pub amount_cents: i64,
}

impl NewExpense {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_expense_description(&self.description)?;
        validate_amount_cents(self.amount_cents)
    }
}

/// Inclusive `from`, exclusive `to`; either may be open.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    pub async fn create(&self, input: &NewExpense) -> DbResult<Expense> {
        input.validate()?;

        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            description: input.description.trim().to_string(),
            category: input
                .category
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            amount_cents: input.amount_cents,
            created_at: Utc::now(),
        };

        debug!(id = %expense.id, amount_cents = expense.amount_cents, "Recording expense");

        sqlx::query(
            r#"
            INSERT INTO expenses (id, description, category, amount_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.description)
        .bind(&expense.category)
        .bind(expense.amount_cents)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Newest first.
    pub async fn list(&self, range: DateRange) -> DbResult<Vec<Expense>> {
        let sql = format!(
            r#"
            SELECT {EXPENSE_COLUMNS}
            FROM expenses
            WHERE (?1 IS NULL OR created_at >= ?1)
              AND (?2 IS NULL OR created_at < ?2)
            ORDER BY created_at DESC
            "#
        );

        let expenses = sqlx::query_as::<_, Expense>(&sql)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(&self.pool)
            .await?;

        Ok(expenses)
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting expense");

        let result = sqlx::query("DELETE FROM expenses WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        Ok(())
    }
}

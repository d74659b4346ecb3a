//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - Substring search across name, barcode and category
//! - CRUD with soft delete
//! - Guarded stock movements
//!
//! ## Stock Guard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Every Stock Movement                                 │
//! │                                                                         │
//! │  UPDATE products SET stock = stock + :delta                            │
//! │  WHERE id = :id AND stock + :delta >= 0                                │
//! │       │                                                                 │
//! │       ├── 1 row  → done                                                 │
//! │       └── 0 rows → product missing?  → NotFound                        │
//! │                    otherwise         → InsufficientStock               │
//! │                                                                         │
//! │  Deltas, never absolute writes: two tills selling the same product     │
//! │  can't overwrite each other's decrement.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use minimarket_core::validation::{
    validate_barcode, validate_price_cents, validate_product_name, validate_search_query,
    validate_stock, validate_stock_delta, ValidationResult,
};
use minimarket_core::{Product, ValidationError, MAX_STOCK};

const PRODUCT_COLUMNS: &str =
    "id, name, barcode, category, price_cents, stock, is_active, created_at, updated_at";

// =============================================================================
// Inputs
// =============================================================================

/// Fields for a new catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i64,
}

impl NewProduct {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_product_name(&self.name)?;
        if let Some(barcode) = normalize(&self.barcode) {
            validate_barcode(&barcode)?;
        }
        validate_price_cents(self.price_cents)?;
        validate_stock(self.stock)
    }
}

/// Replacement values for an existing product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ProductUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_product_name(&self.name)?;
        if let Some(barcode) = normalize(&self.barcode) {
            validate_barcode(&barcode)?;
        }
        validate_price_cents(self.price_cents)?;
        validate_stock(self.stock)
    }
}

fn default_true() -> bool {
    true
}

/// Blank optional text becomes NULL so the UNIQUE barcode index ignores it.
fn normalize(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Escapes LIKE wildcards in user input.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let results = repo.search("rice", 20).await?;
/// let product = repo.get_by_barcode("5449000000996").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Searches active products by name, barcode or category substring.
    ///
    /// ## Arguments
    /// * `query` - Search term (can be partial, case-insensitive for ASCII)
    /// * `limit` - Maximum results to return
    ///
    /// An empty query lists active products by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = validate_search_query(query)?;

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list_active(limit).await;
        }

        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE is_active = 1
              AND (name LIKE ?1 ESCAPE '\'
                   OR barcode LIKE ?1 ESCAPE '\'
                   OR category LIKE ?1 ESCAPE '\')
            ORDER BY name
            LIMIT ?2
            "#
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(like_pattern(&query))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name LIMIT ?1"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Gets a product by its ID, active or not.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Like [`get_by_id`](Self::get_by_id) but a missing product is an error.
    pub async fn require(&self, id: &str) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Gets an active product by scanned barcode.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let barcode = barcode.trim();
        debug!(barcode = %barcode, "Barcode lookup");

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1 AND is_active = 1"
        );

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Fetches every product whose id is in `ids`. Missing ids are skipped.
    pub async fn get_many(&self, ids: &[String]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id IN ({placeholders})");

        let mut query = sqlx::query_as::<_, Product>(&sql);
        for id in ids {
            query = query.bind(id);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with generated id and timestamps
    /// * `Err(DbError::UniqueViolation)` - Barcode already exists
    pub async fn insert(&self, input: &NewProduct) -> DbResult<Product> {
        input.validate()?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            barcode: normalize(&input.barcode),
            category: normalize(&input.category),
            price_cents: input.price_cents,
            stock: input.stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, barcode, category, price_cents, stock,
                is_active, created_at, updated_at
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
        .execute(&self.pool)
        .await
        .map_err(|e| barcode_conflict(e, &product.barcode))?;

        Ok(product)
    }

    /// Updates an existing product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The stored row after the update
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, id: &str, input: &ProductUpdate) -> DbResult<Product> {
        input.validate()?;

        debug!(id = %id, "Updating product");

        let barcode = normalize(&input.barcode);
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                barcode = ?3,
                category = ?4,
                price_cents = ?5,
                stock = ?6,
                is_active = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(&barcode)
        .bind(normalize(&input.category))
        .bind(input.price_cents)
        .bind(input.stock)
        .bind(input.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| barcode_conflict(e, &barcode))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.require(id).await
    }

    /// Soft-deletes a product.
    ///
    /// The row stays so past sale items keep their product reference.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Manual stock adjustment (delivery received, breakage written off).
    ///
    /// ## Arguments
    /// * `id` - Product ID
    /// * `delta` - Change in stock (negative for write-offs, positive for restocking)
    ///
    /// ## Returns
    /// The product after the adjustment.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<Product> {
        validate_stock_delta(delta)?;

        let mut conn = self.pool.acquire().await?;
        apply_stock_delta(&mut *conn, id, delta).await?;
        drop(conn);

        self.require(id).await
    }

    /// Active products at or below `threshold`, lowest stock first.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<Product>> {
        debug!(threshold = %threshold, "Listing low-stock products");

        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE is_active = 1 AND stock <= ?1
            ORDER BY stock, name
            "#
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(threshold)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Number of active products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Shared stock movement
// =============================================================================

/// Moves `product_id`'s stock by `delta` on the given connection.
///
/// Takes a connection rather than the pool so callers can run it inside
/// their own transaction.
pub(crate) async fn apply_stock_delta(
    conn: &mut SqliteConnection,
    product_id: &str,
    delta: i64,
) -> DbResult<()> {
    debug!(product_id = %product_id, delta = %delta, "Applying stock delta");

    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock + ?2, updated_at = ?3
        WHERE id = ?1 AND stock + ?2 >= 0 AND stock + ?2 <= ?4
        "#,
    )
    .bind(product_id)
    .bind(delta)
    .bind(Utc::now())
    .bind(MAX_STOCK)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

    match available {
        Some(_) if delta > 0 => Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: MAX_STOCK,
        }
        .into()),
        Some(available) => Err(DbError::insufficient_stock(product_id, available, -delta)),
        None => Err(DbError::not_found("Product", product_id)),
    }
}

fn barcode_conflict(err: sqlx::Error, barcode: &Option<String>) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => {
            DbError::duplicate("barcode", barcode.clone().unwrap_or_default())
        }
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_product(name: &str, barcode: Option<&str>, stock: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            barcode: barcode.map(str::to_string),
            category: Some("Groceries".to_string()),
            price_cents: 1000,
            stock,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = db().await;
        let repo = db.products();

        let created = repo
            .insert(&new_product("Rice 1kg", Some("5449000000996"), 5))
            .await
            .unwrap();

        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);

        let scanned = repo.get_by_barcode("5449000000996").await.unwrap().unwrap();
        assert_eq!(scanned.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_barcode_rejected() {
        let db = db().await;
        let repo = db.products();

        repo.insert(&new_product("Rice", Some("12345678"), 1)).await.unwrap();
        let err = repo
            .insert(&new_product("Other rice", Some("12345678"), 1))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "barcode"));
    }

    #[tokio::test]
    async fn test_blank_barcodes_do_not_collide() {
        let db = db().await;
        let repo = db.products();

        let a = repo.insert(&new_product("A", Some("  "), 1)).await.unwrap();
        repo.insert(&new_product("B", None, 1)).await.unwrap();

        assert_eq!(a.barcode, None);
    }

    #[tokio::test]
    async fn test_search_matches_name_barcode_and_category() {
        let db = db().await;
        let repo = db.products();

        repo.insert(&new_product("Basmati Rice", Some("11112222"), 5)).await.unwrap();
        repo.insert(&new_product("Matches", Some("99998888"), 5)).await.unwrap();

        assert_eq!(repo.search("rice", 10).await.unwrap().len(), 1);
        assert_eq!(repo.search("9999", 10).await.unwrap()[0].name, "Matches");
        assert_eq!(repo.search("grocer", 10).await.unwrap().len(), 2);
        assert_eq!(repo.search("", 10).await.unwrap().len(), 2);
        // LIKE wildcards are literal
        assert!(repo.search("%", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_search() {
        let db = db().await;
        let repo = db.products();

        let p = repo.insert(&new_product("Soap", Some("55556666"), 2)).await.unwrap();
        repo.soft_delete(&p.id).await.unwrap();

        assert!(repo.search("soap", 10).await.unwrap().is_empty());
        assert!(repo.get_by_barcode("55556666").await.unwrap().is_none());
        assert!(!repo.require(&p.id).await.unwrap().is_active);
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let db = db().await;
        let update = ProductUpdate {
            name: "Ghost".to_string(),
            barcode: None,
            category: None,
            price_cents: 100,
            stock: 1,
            is_active: true,
        };

        let err = db.products().update("missing", &update).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_adjust_stock_never_below_zero() {
        let db = db().await;
        let repo = db.products();
        let p = repo.insert(&new_product("Milk", None, 3)).await.unwrap();

        assert_eq!(repo.adjust_stock(&p.id, 4).await.unwrap().stock, 7);
        assert_eq!(repo.adjust_stock(&p.id, -7).await.unwrap().stock, 0);

        let err = repo.adjust_stock(&p.id, -1).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::InsufficientStock { available: 0, requested: 1, .. }
        ));
        assert!(matches!(
            repo.adjust_stock("missing", 1).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
        assert!(repo.adjust_stock(&p.id, 0).await.is_err());
    }

    #[tokio::test]
    async fn test_stock_ceiling() {
        let db = db().await;
        let repo = db.products();

        assert!(repo.insert(&new_product("Too many", None, MAX_STOCK + 1)).await.is_err());

        let p = repo.insert(&new_product("Salt", None, MAX_STOCK - 1)).await.unwrap();
        assert_eq!(repo.adjust_stock(&p.id, 1).await.unwrap().stock, MAX_STOCK);

        let err = repo.adjust_stock(&p.id, 1).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(minimarket_core::CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert_eq!(repo.require(&p.id).await.unwrap().stock, MAX_STOCK);
    }

    #[tokio::test]
    async fn test_low_stock_threshold() {
        let db = db().await;
        let repo = db.products();
        repo.insert(&new_product("Low", None, 2)).await.unwrap();
        repo.insert(&new_product("Edge", None, 5)).await.unwrap();
        repo.insert(&new_product("Plenty", None, 50)).await.unwrap();

        let low = repo.low_stock(5).await.unwrap();
        let names: Vec<_> = low.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Low", "Edge"]);
    }

    #[tokio::test]
    async fn test_get_many_skips_missing() {
        let db = db().await;
        let repo = db.products();
        let a = repo.insert(&new_product("A", None, 1)).await.unwrap();

        let found = repo
            .get_many(&[a.id.clone(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(repo.get_many(&[]).await.unwrap().is_empty());
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }
}

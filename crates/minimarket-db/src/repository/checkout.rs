//! # Checkout Repository
//!
//! Every write that touches both sales and stock, each in one SQLite
//! transaction.
//!
//! ## Checkout Commit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    1. INSERT sales       (total = Σ line subtotals, status completed)  │
//! │    2. INSERT sale_items  (one per cart line, price snapshot)           │
//! │    3. UPDATE products    stock = stock - qty  (guarded, never < 0)     │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any step fails → the transaction is dropped → nothing was written.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Resumed checkouts and admin edits diff the stored lines against the new
//! ones ([`SaleEditPlan`]) and apply row changes plus net stock deltas in
//! the same way. Deleting a sale puts every unit back on the shelf.

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::product::apply_stock_delta;
use super::sale::fetch_detail;
use crate::error::{DbError, DbResult};
use minimarket_core::validation::{validate_price_cents, validate_quantity};
use minimarket_core::{
    CartLine, CoreError, LineChange, Money, PaymentMethod, Sale, SaleDetail, SaleEdit,
    SaleEditPlan, SaleItem, SaleStatus,
};

#[derive(Debug, Clone)]
pub struct CheckoutRepository {
    pool: SqlitePool,
}

impl CheckoutRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutRepository { pool }
    }

    /// Commits a cart as a new sale.
    ///
    /// ## Arguments
    /// * `lines` - The cart lines, in display order
    /// * `payment_method` - How the customer paid
    /// * `cashier_id` - Profile ringing up the sale; required
    ///
    /// ## Returns
    /// * `Ok(SaleDetail)` - The committed sale and its items
    /// * `Err(DbError::Core(CashierRequired | EmptyCart))` - Rejected before any write
    /// * `Err(DbError::NotFound)` - Unknown cashier or product
    /// * `Err(DbError::InsufficientStock)` - A line outran the shelf; rolled back
    pub async fn commit_sale(
        &self,
        lines: &[CartLine],
        payment_method: PaymentMethod,
        cashier_id: Option<&str>,
    ) -> DbResult<SaleDetail> {
        let cashier_id = cashier_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(CoreError::CashierRequired)?;

        if lines.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }
        let mut subtotals = Vec::with_capacity(lines.len());
        for line in lines {
            validate_quantity(line.quantity)?;
            validate_price_cents(line.unit_price_cents)?;
            let subtotal = line
                .unit_price()
                .checked_multiply_quantity(line.quantity)
                .ok_or_else(|| CoreError::AmountOutOfRange(format!("subtotal of {}", line.name)))?;
            subtotals.push(subtotal);
        }
        let total = Money::checked_sum(subtotals.iter().copied())
            .ok_or_else(|| CoreError::AmountOutOfRange("sale total".to_string()))?;

        debug!(
            cashier_id = %cashier_id,
            lines = lines.len(),
            payment_method = %payment_method,
            "Committing sale"
        );

        let mut tx = self.pool.begin().await?;
        ensure_cashier(&mut *tx, cashier_id).await?;

        let now = Utc::now();
        let sale_id = Uuid::new_v4().to_string();

        let items: Vec<SaleItem> = lines
            .iter()
            .zip(&subtotals)
            .map(|(line, subtotal)| SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                product_id: line.product_id.clone(),
                name_snapshot: line.name.clone(),
                unit_price_cents: line.unit_price_cents,
                quantity: line.quantity,
                subtotal_cents: subtotal.cents(),
                created_at: now,
            })
            .collect();

        let sale = Sale {
            id: sale_id,
            total_cents: total.cents(),
            payment_method,
            status: SaleStatus::Completed,
            cashier_id: cashier_id.to_string(),
            created_at: now,
            updated_at: now,
        };

        insert_sale(&mut *tx, &sale).await?;
        for item in &items {
            insert_item(&mut *tx, item).await?;
        }
        for (product_id, quantity) in quantities_by_product(&items) {
            apply_stock_delta(&mut *tx, &product_id, -quantity).await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            total_cents = sale.total_cents,
            items = items.len(),
            "Sale committed"
        );

        Ok(SaleDetail { sale, items })
    }

    /// Commits a resumed cart as an update of the sale it came from.
    ///
    /// An unchanged cart with the same payment method writes nothing.
    pub async fn commit_resumed(
        &self,
        sale_id: &str,
        lines: &[CartLine],
        payment_method: PaymentMethod,
    ) -> DbResult<SaleDetail> {
        for line in lines {
            validate_quantity(line.quantity)?;
        }

        debug!(sale_id = %sale_id, lines = lines.len(), "Committing resumed sale");

        let mut tx = self.pool.begin().await?;
        let detail = fetch_detail(&mut *tx, sale_id).await?;
        let plan = SaleEditPlan::reconcile(&detail.items, lines)?;

        if plan.is_noop() && detail.sale.payment_method == payment_method {
            debug!(sale_id = %sale_id, "Resumed sale unchanged");
            return Ok(detail);
        }

        apply_plan(&mut *tx, &detail.sale, &plan, payment_method).await?;
        let updated = fetch_detail(&mut *tx, sale_id).await?;
        tx.commit().await?;

        info!(
            sale_id = %sale_id,
            changes = plan.changes.len(),
            total_cents = updated.sale.total_cents,
            "Resumed sale committed"
        );

        Ok(updated)
    }

    /// Applies an admin correction to a committed sale.
    ///
    /// ## Returns
    /// The sale after the edit. Status becomes `edited` unless the edit
    /// changed nothing.
    pub async fn edit_sale(&self, sale_id: &str, edit: &SaleEdit) -> DbResult<SaleDetail> {
        debug!(
            sale_id = %sale_id,
            updated = edit.lines.len(),
            removed = edit.removed.len(),
            "Editing sale"
        );

        let mut tx = self.pool.begin().await?;
        let detail = fetch_detail(&mut *tx, sale_id).await?;
        let plan = SaleEditPlan::for_edit(&detail.items, edit)?;

        if plan.is_noop() {
            return Ok(detail);
        }

        let payment_method = detail.sale.payment_method;
        apply_plan(&mut *tx, &detail.sale, &plan, payment_method).await?;
        let updated = fetch_detail(&mut *tx, sale_id).await?;
        tx.commit().await?;

        info!(
            sale_id = %sale_id,
            changes = plan.changes.len(),
            total_cents = updated.sale.total_cents,
            "Sale edited"
        );

        Ok(updated)
    }

    /// Deletes a sale, restoring the stock of every item.
    ///
    /// ## Returns
    /// The deleted sale, for the caller's records.
    pub async fn delete_sale(&self, sale_id: &str) -> DbResult<SaleDetail> {
        debug!(sale_id = %sale_id, "Deleting sale");

        let mut tx = self.pool.begin().await?;
        let detail = fetch_detail(&mut *tx, sale_id).await?;

        for (product_id, quantity) in quantities_by_product(&detail.items) {
            apply_stock_delta(&mut *tx, &product_id, quantity).await?;
        }

        sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", sale_id));
        }

        tx.commit().await?;

        info!(
            sale_id = %sale_id,
            items = detail.items.len(),
            "Sale deleted, stock restored"
        );

        Ok(detail)
    }
}

// =============================================================================
// Transaction steps
// =============================================================================

async fn ensure_cashier(conn: &mut SqliteConnection, cashier_id: &str) -> DbResult<()> {
    let active: Option<bool> = sqlx::query_scalar("SELECT is_active FROM profiles WHERE id = ?1")
        .bind(cashier_id)
        .fetch_optional(&mut *conn)
        .await?;

    match active {
        Some(true) => Ok(()),
        Some(false) => {
            warn!(cashier_id = %cashier_id, "Checkout by inactive profile");
            Err(DbError::Conflict(format!("Profile {} is inactive", cashier_id)))
        }
        None => Err(DbError::not_found("Profile", cashier_id)),
    }
}

pub(crate) async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, total_cents, payment_method, status, cashier_id, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&sale.id)
    .bind(sale.total_cents)
    .bind(sale.payment_method)
    .bind(sale.status)
    .bind(&sale.cashier_id)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, product_id, name_snapshot, unit_price_cents,
            quantity, subtotal_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(&item.name_snapshot)
    .bind(item.unit_price_cents)
    .bind(item.quantity)
    .bind(item.subtotal_cents)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::ForeignKeyViolation { .. } => DbError::not_found("Product", &item.product_id),
        other => other,
    })?;

    Ok(())
}

/// Stock first (returns before withdrawals), then rows, then the header.
async fn apply_plan(
    conn: &mut SqliteConnection,
    sale: &Sale,
    plan: &SaleEditPlan,
    payment_method: PaymentMethod,
) -> DbResult<()> {
    for (product_id, delta) in plan.stock_deltas() {
        apply_stock_delta(&mut *conn, &product_id, delta).await?;
    }

    let now = Utc::now();
    for change in &plan.changes {
        match change {
            LineChange::Update {
                item_id,
                new_quantity,
                unit_price_cents,
                subtotal_cents,
                ..
            } => {
                sqlx::query(
                    r#"
                    UPDATE sale_items
                    SET quantity = ?2, unit_price_cents = ?3, subtotal_cents = ?4
                    WHERE id = ?1
                    "#,
                )
                .bind(item_id)
                .bind(new_quantity)
                .bind(unit_price_cents)
                .bind(subtotal_cents)
                .execute(&mut *conn)
                .await?;
            }
            LineChange::Delete { item_id, .. } => {
                sqlx::query("DELETE FROM sale_items WHERE id = ?1")
                    .bind(item_id)
                    .execute(&mut *conn)
                    .await?;
            }
            LineChange::Insert {
                product_id,
                name,
                quantity,
                unit_price_cents,
                subtotal_cents,
            } => {
                let item = SaleItem {
                    id: Uuid::new_v4().to_string(),
                    sale_id: sale.id.clone(),
                    product_id: product_id.clone(),
                    name_snapshot: name.clone(),
                    unit_price_cents: *unit_price_cents,
                    quantity: *quantity,
                    subtotal_cents: *subtotal_cents,
                    created_at: now,
                };
                insert_item(&mut *conn, &item).await?;
            }
        }
    }

    sqlx::query(
        r#"
        UPDATE sales
        SET total_cents = ?2, payment_method = ?3, status = ?4, updated_at = ?5
        WHERE id = ?1
        "#,
    )
    .bind(&sale.id)
    .bind(plan.total_cents)
    .bind(payment_method)
    .bind(SaleStatus::Edited)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Total quantity per product, in product id order.
fn quantities_by_product(items: &[SaleItem]) -> BTreeMap<String, i64> {
    let mut totals = BTreeMap::new();
    for item in items {
        *totals.entry(item.product_id.clone()).or_insert(0) += item.quantity;
    }
    totals
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::NewProduct;
    use minimarket_core::{Cart, ContinueSalePayload, EditLine, Product};

    const CASHIER: &str = "cashier-1";

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        sqlx::query(
            "INSERT INTO profiles (id, full_name, email, role, password_hash, is_active, created_at)
             VALUES (?1, 'Till One', 'till@example.com', 'cashier', 'x', 1, ?2)",
        )
        .bind(CASHIER)
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap();
        db
    }

    async fn product(db: &Database, name: &str, price_cents: i64, stock: i64) -> Product {
        db.products()
            .insert(&NewProduct {
                name: name.to_string(),
                barcode: None,
                category: None,
                price_cents,
                stock,
            })
            .await
            .unwrap()
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products().require(id).await.unwrap().stock
    }

    fn cart_with(items: &[(&Product, i64)]) -> Cart {
        let mut cart = Cart::new();
        for (product, qty) in items {
            for _ in 0..*qty {
                cart.add_item(product).unwrap();
            }
        }
        cart
    }

    #[tokio::test]
    async fn test_checkout_example_scenario() {
        let db = setup().await;
        let a = product(&db, "A", 1000, 5).await;
        let cart = cart_with(&[(&a, 3)]);
        assert_eq!(cart.total().cents(), 3000);

        let detail = db
            .checkout()
            .commit_sale(cart.lines(), PaymentMethod::Cash, Some(CASHIER))
            .await
            .unwrap();

        assert_eq!(detail.sale.total_cents, 3000);
        assert_eq!(detail.sale.status, SaleStatus::Completed);
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].quantity, 3);
        assert_eq!(detail.items[0].subtotal_cents, 3000);
        assert_eq!(stock_of(&db, &a.id).await, 2);

        let stored = db.sales().get_detail(&detail.sale.id).await.unwrap();
        assert_eq!(stored, detail);
    }

    #[tokio::test]
    async fn test_checkout_totals_match_items() {
        let db = setup().await;
        let a = product(&db, "A", 250, 10).await;
        let b = product(&db, "B", 1999, 10).await;
        let cart = cart_with(&[(&a, 4), (&b, 2)]);

        let detail = db
            .checkout()
            .commit_sale(cart.lines(), PaymentMethod::Card, Some(CASHIER))
            .await
            .unwrap();

        assert_eq!(detail.sale.total_cents, cart.total().cents());
        assert_eq!(detail.items.len(), cart.item_count());
        assert_eq!(detail.items_total(), cart.total());
        assert_eq!(stock_of(&db, &a.id).await, 6);
        assert_eq!(stock_of(&db, &b.id).await, 8);
    }

    #[tokio::test]
    async fn test_checkout_requires_known_cashier() {
        let db = setup().await;
        let a = product(&db, "A", 100, 5).await;
        let cart = cart_with(&[(&a, 1)]);
        let checkout = db.checkout();

        assert!(matches!(
            checkout.commit_sale(cart.lines(), PaymentMethod::Cash, None).await,
            Err(DbError::Core(CoreError::CashierRequired))
        ));
        assert!(matches!(
            checkout.commit_sale(cart.lines(), PaymentMethod::Cash, Some("  ")).await,
            Err(DbError::Core(CoreError::CashierRequired))
        ));
        assert!(matches!(
            checkout.commit_sale(cart.lines(), PaymentMethod::Cash, Some("ghost")).await,
            Err(DbError::NotFound { .. })
        ));
        assert_eq!(db.sales().count().await.unwrap(), 0);
        assert_eq!(stock_of(&db, &a.id).await, 5);
    }

    #[tokio::test]
    async fn test_checkout_rejects_empty_cart() {
        let db = setup().await;
        let err = db
            .checkout()
            .commit_sale(&[], PaymentMethod::Cash, Some(CASHIER))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_checkout_rejects_price_above_ceiling() {
        let db = setup().await;
        let a = product(&db, "A", 1000, 5).await;

        let mut line = CartLine::from_product(&a, 5);
        line.unit_price_cents = i64::MAX / 2 + 1;
        line.quantity = 2;

        let err = db
            .checkout()
            .commit_sale(&[line], PaymentMethod::Cash, Some(CASHIER))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
        assert_eq!(stock_of(&db, &a.id).await, 5);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_everything() {
        let db = setup().await;
        let a = product(&db, "A", 100, 5).await;
        let b = product(&db, "B", 100, 2).await;
        let cart = cart_with(&[(&a, 3), (&b, 2)]);

        // Someone else sold one B after it went into the cart.
        db.products().adjust_stock(&b.id, -1).await.unwrap();

        let err = db
            .checkout()
            .commit_sale(cart.lines(), PaymentMethod::Cash, Some(CASHIER))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::InsufficientStock { available: 1, requested: 2, .. }
        ));
        assert_eq!(db.sales().count().await.unwrap(), 0);
        assert_eq!(stock_of(&db, &a.id).await, 5);
        assert_eq!(stock_of(&db, &b.id).await, 1);
    }

    async fn committed(db: &Database, items: &[(&Product, i64)]) -> SaleDetail {
        let cart = cart_with(items);
        db.checkout()
            .commit_sale(cart.lines(), PaymentMethod::Card, Some(CASHIER))
            .await
            .unwrap()
    }

    async fn resume(db: &Database, sale_id: &str) -> Cart {
        let detail = db.sales().get_detail(sale_id).await.unwrap();
        let ids: Vec<String> = detail.items.iter().map(|i| i.product_id.clone()).collect();
        let shelf = db.products().get_many(&ids).await.unwrap();

        let mut cart = Cart::new();
        ContinueSalePayload::from_sale(&detail, &shelf)
            .seed_cart(&mut cart)
            .unwrap();
        cart
    }

    #[tokio::test]
    async fn test_resumed_unchanged_cart_is_stock_neutral() {
        let db = setup().await;
        let a = product(&db, "A", 1000, 5).await;
        let b = product(&db, "B", 200, 4).await;
        let sale = committed(&db, &[(&a, 3), (&b, 2)]).await;

        let cart = resume(&db, &sale.sale.id).await;
        let after = db
            .checkout()
            .commit_resumed(&sale.sale.id, cart.lines(), PaymentMethod::Card)
            .await
            .unwrap();

        assert_eq!(after.sale.total_cents, sale.sale.total_cents);
        assert_eq!(after.items, sale.items);
        assert_eq!(after.sale.status, SaleStatus::Completed);
        assert_eq!(stock_of(&db, &a.id).await, 2);
        assert_eq!(stock_of(&db, &b.id).await, 2);
    }

    #[tokio::test]
    async fn test_resumed_cart_can_use_units_the_sale_holds() {
        let db = setup().await;
        let a = product(&db, "A", 1000, 3).await;
        let c = product(&db, "C", 50, 10).await;
        let sale = committed(&db, &[(&a, 3)]).await;
        assert_eq!(stock_of(&db, &a.id).await, 0);

        let mut cart = resume(&db, &sale.sale.id).await;
        // Shelf is empty but the sale's own three units are still available.
        cart.update_quantity(&a.id, 2).unwrap();
        cart.update_quantity(&a.id, 3).unwrap();
        cart.update_quantity(&a.id, 1).unwrap();
        cart.add_item(&db.products().require(&c.id).await.unwrap()).unwrap();

        let after = db
            .checkout()
            .commit_resumed(&sale.sale.id, cart.lines(), PaymentMethod::Cash)
            .await
            .unwrap();

        assert_eq!(after.sale.id, sale.sale.id);
        assert_eq!(after.sale.status, SaleStatus::Edited);
        assert_eq!(after.sale.payment_method, PaymentMethod::Cash);
        assert_eq!(after.sale.total_cents, 1000 + 50);
        assert_eq!(after.items.len(), 2);
        assert_eq!(stock_of(&db, &a.id).await, 2);
        assert_eq!(stock_of(&db, &c.id).await, 9);
        assert_eq!(db.sales().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_resumed_cart_dropping_a_line_restores_it() {
        let db = setup().await;
        let a = product(&db, "A", 1000, 5).await;
        let b = product(&db, "B", 200, 4).await;
        let sale = committed(&db, &[(&a, 1), (&b, 3)]).await;

        let mut cart = resume(&db, &sale.sale.id).await;
        cart.remove_item(&b.id);

        let after = db
            .checkout()
            .commit_resumed(&sale.sale.id, cart.lines(), PaymentMethod::Card)
            .await
            .unwrap();

        assert_eq!(after.items.len(), 1);
        assert_eq!(after.sale.total_cents, 1000);
        assert_eq!(stock_of(&db, &b.id).await, 4);
    }

    #[tokio::test]
    async fn test_edit_moves_stock_by_quantity_difference() {
        let db = setup().await;
        let a = product(&db, "A", 1000, 10).await;
        let sale = committed(&db, &[(&a, 5)]).await;
        let item_id = sale.items[0].id.clone();

        for (q1, q2) in [(5, 3), (3, 8)] {
            let before = stock_of(&db, &a.id).await;
            let edit = SaleEdit {
                lines: vec![EditLine {
                    item_id: item_id.clone(),
                    quantity: q2,
                }],
                removed: vec![],
            };

            let after = db.checkout().edit_sale(&sale.sale.id, &edit).await.unwrap();

            assert_eq!(stock_of(&db, &a.id).await - before, q1 - q2);
            assert_eq!(after.sale.total_cents, q2 * 1000);
            assert_eq!(after.sale.status, SaleStatus::Edited);
        }
    }

    #[tokio::test]
    async fn test_edit_past_stock_rolls_back() {
        let db = setup().await;
        let a = product(&db, "A", 1000, 5).await;
        let sale = committed(&db, &[(&a, 5)]).await;

        let edit = SaleEdit {
            lines: vec![EditLine {
                item_id: sale.items[0].id.clone(),
                quantity: 6,
            }],
            removed: vec![],
        };
        let err = db.checkout().edit_sale(&sale.sale.id, &edit).await.unwrap_err();

        assert!(matches!(err, DbError::InsufficientStock { .. }));
        let stored = db.sales().get_detail(&sale.sale.id).await.unwrap();
        assert_eq!(stored, sale);
        assert_eq!(stock_of(&db, &a.id).await, 0);
    }

    #[tokio::test]
    async fn test_edit_removing_line_restores_stock() {
        let db = setup().await;
        let a = product(&db, "A", 1000, 5).await;
        let b = product(&db, "B", 300, 5).await;
        let sale = committed(&db, &[(&a, 1), (&b, 4)]).await;
        let b_item = sale.items.iter().find(|i| i.product_id == b.id).unwrap();

        let edit = SaleEdit {
            lines: vec![],
            removed: vec![b_item.id.clone()],
        };
        let after = db.checkout().edit_sale(&sale.sale.id, &edit).await.unwrap();

        assert_eq!(after.items.len(), 1);
        assert_eq!(after.sale.total_cents, 1000);
        assert_eq!(stock_of(&db, &b.id).await, 5);
    }

    #[tokio::test]
    async fn test_delete_sale_restores_stock() {
        let db = setup().await;
        let a = product(&db, "A", 1000, 5).await;
        let sale = committed(&db, &[(&a, 4)]).await;

        db.checkout().delete_sale(&sale.sale.id).await.unwrap();

        assert_eq!(stock_of(&db, &a.id).await, 5);
        assert!(db.sales().get_by_id(&sale.sale.id).await.unwrap().is_none());
        assert!(db.sales().get_items(&sale.sale.id).await.unwrap().is_empty());
        assert!(matches!(
            db.checkout().delete_sale(&sale.sale.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}

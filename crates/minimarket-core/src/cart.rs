//! # Cart Engine
//!
//! The in-memory cart of one checkout session.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Cashier Action          Cart Method            Effect                  │
//! │  ──────────────          ───────────            ──────                  │
//! │                                                                         │
//! │  Scan / click product ─► add_item(p) ─────────► qty + 1 (or new line)  │
//! │                                                 rejected past stock     │
//! │                                                                         │
//! │  Type a quantity ──────► update_quantity() ───► qty = n, subtotal      │
//! │                                                 n < 1 ignored           │
//! │                                                 n > stock rejected      │
//! │                                                                         │
//! │  Click remove ─────────► remove_item() ───────► line gone              │
//! │                                                                         │
//! │  Cancel / after sale ──► clear() ─────────────► empty                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `product_id`; adding again merges into the line
//! - Every line has `1 <= quantity <= stock` where stock is the line's
//!   known availability
//! - `subtotal_cents == quantity × unit_price_cents` for every line
//! - A rejected operation leaves the cart exactly as it was
//!
//! ## Reserved Quantities
//! A cart seeded from a committed sale (continue-sale) is editing units the
//! sale already took off the shelf. Those units are recorded as *reserved*
//! and count towards what the line may hold, on top of the shelf stock.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::Product;
use crate::validation::validate_price_cents;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One line of the cart.
///
/// Name, barcode and unit price are frozen when the line is created, so the
/// cart keeps charging what the cashier saw even if the catalog changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub barcode: Option<String>,
    /// Price in cents at time of adding (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// quantity × unit_price_cents
    pub subtotal_cents: i64,
    /// Most units this line may hold, as last seen.
    pub stock: i64,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Creates a line with quantity 1 from a product.
    pub fn from_product(product: &Product, available: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            barcode: product.barcode.clone(),
            unit_price_cents: product.price_cents,
            quantity: 1,
            subtotal_cents: product.price_cents,
            stock: available,
            added_at: Utc::now(),
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    /// Sets the quantity and recomputes the subtotal.
    ///
    /// The line is untouched when the subtotal would overflow.
    pub fn set_quantity(&mut self, quantity: i64) -> CoreResult<()> {
        let subtotal = self
            .unit_price()
            .checked_multiply_quantity(quantity)
            .ok_or_else(|| CoreError::AmountOutOfRange(format!("subtotal of {}", self.name)))?;

        self.quantity = quantity;
        self.subtotal_cents = subtotal.cents();
        Ok(())
    }

    fn stock_limit(&self, requested: i64) -> CoreError {
        CoreError::StockLimitExceeded {
            product_id: self.product_id.clone(),
            name: self.name.clone(),
            available: self.stock,
            requested,
        }
    }
}

/// Outcome of [`Cart::update_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityUpdate {
    /// Quantity and subtotal changed.
    Updated,
    /// Requested quantity was below 1; nothing changed.
    Ignored,
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Clone)]
pub struct Cart {
    lines: Vec<CartLine>,
    reserved: HashMap<String, i64>,
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            reserved: HashMap::new(),
        }
    }

    /// Shelf stock plus what a seeding sale already holds.
    fn available(&self, product: &Product) -> CoreResult<i64> {
        product
            .stock
            .checked_add(self.reserved_for(&product.id))
            .ok_or_else(|| CoreError::AmountOutOfRange(format!("stock of {}", product.name)))
    }

    /// Adds one unit of a product.
    ///
    /// ## Behavior
    /// - Product already in cart: quantity + 1, unless that exceeds stock
    /// - Product not in cart: new line with quantity 1, unless stock is 0
    ///
    /// The line's known stock is refreshed from `product` either way.
    ///
    /// ## Errors
    /// - `StockLimitExceeded` when the shelf cannot cover one more unit
    /// - `QuantityTooLarge` past MAX_ITEM_QUANTITY
    /// - `CartTooLarge` past MAX_CART_ITEMS distinct lines
    /// - `Validation` when the price is outside `0..=MAX_PRICE_CENTS`
    pub fn add_item(&mut self, product: &Product) -> CoreResult<()> {
        validate_price_cents(product.price_cents)?;
        let available = self.available(product)?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            let requested = line.quantity + 1;
            line.stock = available;

            if requested > available {
                return Err(line.stock_limit(requested));
            }
            if requested > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested,
                    max: MAX_ITEM_QUANTITY,
                });
            }

            return line.set_quantity(requested);
        }

        if available < 1 {
            return Err(CoreError::StockLimitExceeded {
                product_id: product.id.clone(),
                name: product.name.clone(),
                available: available.max(0),
                requested: 1,
            });
        }

        if self.lines.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.lines.push(CartLine::from_product(product, available));
        Ok(())
    }

    /// Sets the quantity of a line.
    ///
    /// ## Behavior
    /// - `quantity < 1`: ignored, cart unchanged
    /// - `quantity > stock`: rejected, cart unchanged
    /// - otherwise: quantity set and subtotal recomputed
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<QuantityUpdate> {
        if quantity < 1 {
            return Ok(QuantityUpdate::Ignored);
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::ProductNotInCart(product_id.to_string()))?;

        if quantity > line.stock {
            return Err(line.stock_limit(quantity));
        }
        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        line.set_quantity(quantity)?;
        Ok(QuantityUpdate::Updated)
    }

    /// Refreshes a line's known stock from the catalog.
    ///
    /// Returns false when the product has no line. Quantities already in the
    /// cart are left alone even if the shelf shrank; checkout rejects them.
    pub fn refresh_stock(&mut self, product: &Product) -> CoreResult<bool> {
        let available = self.available(product)?;
        match self.lines.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => {
                line.stock = available;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes a line. Removing a product that is not in the cart is fine.
    pub fn remove_item(&mut self, product_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    /// Empties the cart, including any reserved quantities.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.reserved.clear();
    }

    /// Replaces the cart with pre-built lines.
    ///
    /// Used when continuing a committed sale and when repeating the last
    /// sale. `reserved` holds the quantities the seeding sale already took
    /// from stock, keyed by product id.
    ///
    /// ## Errors
    /// The cart is left unchanged when any line has a quantity outside
    /// `1..=stock`, a price outside `0..=MAX_PRICE_CENTS`, or a product
    /// appears twice.
    pub fn seed(&mut self, lines: Vec<CartLine>, reserved: HashMap<String, i64>) -> CoreResult<()> {
        if lines.len() > MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        let mut seeded: Vec<CartLine> = Vec::with_capacity(lines.len());
        for mut line in lines {
            if seeded.iter().any(|l| l.product_id == line.product_id) {
                return Err(ValidationError::Duplicate {
                    field: "product_id".to_string(),
                    value: line.product_id,
                }
                .into());
            }
            if line.quantity < 1 {
                return Err(ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                }
                .into());
            }
            if line.quantity > line.stock {
                return Err(line.stock_limit(line.quantity));
            }

            validate_price_cents(line.unit_price_cents)?;

            let quantity = line.quantity;
            line.set_quantity(quantity)?;
            seeded.push(line);
        }

        self.lines = seeded;
        self.reserved = reserved;
        Ok(())
    }

    /// Units of a product that a seeding sale already holds.
    pub fn reserved_for(&self, product_id: &str) -> i64 {
        self.reserved.get(product_id).copied().unwrap_or(0)
    }

    /// Sum of all line subtotals.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_PRICE_CENTS;

    fn product(id: &str, price_cents: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            barcode: None,
            category: None,
            price_cents,
            stock,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_item_three_times() {
        let mut cart = Cart::new();
        let rice = product("A", 1000, 5);

        for _ in 0..3 {
            cart.add_item(&rice).unwrap();
        }

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.line("A").unwrap().quantity, 3);
        assert_eq!(cart.total(), Money::from_cents(3000));
    }

    #[test]
    fn test_add_past_stock_is_rejected_and_cart_unchanged() {
        for stock in 1..=6 {
            let mut cart = Cart::new();
            let p = product("A", 250, stock);

            for _ in 0..stock {
                cart.add_item(&p).unwrap();
            }
            let before = cart.line("A").unwrap().clone();

            let err = cart.add_item(&p).unwrap_err();
            assert!(matches!(
                err,
                CoreError::StockLimitExceeded { available, requested, .. }
                    if available == stock && requested == stock + 1
            ));
            assert_eq!(cart.line("A").unwrap(), &before);
            assert_eq!(cart.total_quantity(), stock);
        }
    }

    #[test]
    fn test_add_out_of_stock_product_is_rejected() {
        let mut cart = Cart::new();
        let err = cart.add_item(&product("A", 100, 0)).unwrap_err();

        assert!(matches!(err, CoreError::StockLimitExceeded { requested: 1, .. }));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_bounds() {
        let mut cart = Cart::new();
        cart.add_item(&product("A", 150, 4)).unwrap();

        assert_eq!(cart.update_quantity("A", 0).unwrap(), QuantityUpdate::Ignored);
        assert_eq!(cart.update_quantity("A", -2).unwrap(), QuantityUpdate::Ignored);
        assert_eq!(cart.line("A").unwrap().quantity, 1);

        assert!(cart.update_quantity("A", 5).is_err());
        assert_eq!(cart.line("A").unwrap().quantity, 1);

        assert_eq!(cart.update_quantity("A", 4).unwrap(), QuantityUpdate::Updated);
        let line = cart.line("A").unwrap();
        assert_eq!(line.quantity, 4);
        assert_eq!(line.subtotal_cents, 600);
    }

    #[test]
    fn test_update_quantity_unknown_product() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.update_quantity("missing", 2),
            Err(CoreError::ProductNotInCart(_))
        ));
    }

    #[test]
    fn test_refresh_stock_tightens_future_updates() {
        let mut cart = Cart::new();
        let mut p = product("A", 100, 10);
        cart.add_item(&p).unwrap();

        p.stock = 2;
        assert!(cart.refresh_stock(&p).unwrap());
        assert!(cart.update_quantity("A", 3).is_err());
        assert!(cart.update_quantity("A", 2).is_ok());
        assert!(!cart.refresh_stock(&product("B", 1, 1)).unwrap());
    }

    #[test]
    fn test_total_is_sum_of_subtotals() {
        let mut cart = Cart::new();
        let a = product("A", 199, 10);
        let b = product("B", 1250, 10);

        cart.add_item(&a).unwrap();
        cart.add_item(&b).unwrap();
        cart.add_item(&a).unwrap();
        cart.update_quantity("B", 3).unwrap();

        let sum: i64 = cart.lines().iter().map(|l| l.subtotal_cents).sum();
        assert_eq!(cart.total().cents(), sum);
        for line in cart.lines() {
            assert_eq!(line.subtotal_cents, line.quantity * line.unit_price_cents);
        }
        assert_eq!(sum, 2 * 199 + 3 * 1250);
    }

    #[test]
    fn test_price_is_frozen_at_add_time() {
        let mut cart = Cart::new();
        let mut p = product("A", 500, 10);
        cart.add_item(&p).unwrap();

        p.price_cents = 900;
        cart.add_item(&p).unwrap();

        assert_eq!(cart.total().cents(), 1000);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add_item(&product("A", 100, 3)).unwrap();
        cart.add_item(&product("B", 100, 3)).unwrap();

        assert!(cart.remove_item("A"));
        assert!(!cart.remove_item("A"));
        assert_eq!(cart.item_count(), 1);

        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.total().is_zero());
    }

    #[test]
    fn test_seed_counts_reserved_units_as_available() {
        let mut cart = Cart::new();
        let p = product("A", 1000, 2);
        let mut line = CartLine::from_product(&p, 5);
        line.quantity = 3;

        let reserved = HashMap::from([("A".to_string(), 3)]);
        cart.seed(vec![line], reserved).unwrap();

        assert_eq!(cart.total().cents(), 3000);
        cart.add_item(&p).unwrap();
        cart.add_item(&p).unwrap();
        assert!(cart.add_item(&p).is_err());
        assert_eq!(cart.line("A").unwrap().quantity, 5);

        cart.clear();
        assert_eq!(cart.reserved_for("A"), 0);
    }

    #[test]
    fn test_seed_rejects_bad_lines_without_touching_cart() {
        let mut cart = Cart::new();
        cart.add_item(&product("Z", 100, 1)).unwrap();

        let p = product("A", 100, 5);
        let mut over = CartLine::from_product(&p, 2);
        over.quantity = 3;
        assert!(cart.seed(vec![over], HashMap::new()).is_err());

        let dup = CartLine::from_product(&p, 5);
        assert!(cart.seed(vec![dup.clone(), dup], HashMap::new()).is_err());

        let mut zero = CartLine::from_product(&p, 5);
        zero.quantity = 0;
        assert!(cart.seed(vec![zero], HashMap::new()).is_err());

        assert_eq!(cart.item_count(), 1);
        assert!(cart.line("Z").is_some());
    }

    #[test]
    fn test_seed_recomputes_subtotals() {
        let mut cart = Cart::new();
        let mut line = CartLine::from_product(&product("A", 400, 9), 9);
        line.quantity = 2;
        line.subtotal_cents = 1;

        cart.seed(vec![line], HashMap::new()).unwrap();
        assert_eq!(cart.line("A").unwrap().subtotal_cents, 800);
    }

    #[test]
    fn test_huge_price_is_rejected_before_any_arithmetic() {
        let mut cart = Cart::new();
        let p = product("A", i64::MAX / 2 + 1, 10);

        let err = cart.add_item(&p).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));
        assert!(cart.is_empty());

        let ceiling = product("B", MAX_PRICE_CENTS, MAX_ITEM_QUANTITY);
        cart.add_item(&ceiling).unwrap();
        cart.update_quantity("B", MAX_ITEM_QUANTITY).unwrap();
        assert_eq!(cart.total().cents(), MAX_PRICE_CENTS * MAX_ITEM_QUANTITY);
    }

    #[test]
    fn test_subtotal_overflow_leaves_line_unchanged() {
        let mut line = CartLine::from_product(&product("A", i64::MAX / 2 + 1, 10), 10);

        let err = line.set_quantity(2).unwrap_err();
        assert!(matches!(err, CoreError::AmountOutOfRange(_)));
        assert_eq!(line.quantity, 1);
        assert_eq!(line.subtotal_cents, i64::MAX / 2 + 1);
    }

    #[test]
    fn test_seed_rejects_price_above_ceiling() {
        let mut cart = Cart::new();
        let mut line = CartLine::from_product(&product("A", 100, 5), 5);
        line.unit_price_cents = MAX_PRICE_CENTS + 1;

        assert!(cart.seed(vec![line], HashMap::new()).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_stock_plus_reserved_overflow_is_an_error() {
        let mut cart = Cart::new();
        let p = product("A", 100, i64::MAX);
        let reserved = HashMap::from([("A".to_string(), 1)]);
        cart.seed(Vec::new(), reserved).unwrap();

        assert!(matches!(cart.add_item(&p), Err(CoreError::AmountOutOfRange(_))));
        assert!(matches!(cart.refresh_stock(&p), Err(CoreError::AmountOutOfRange(_))));
        assert!(cart.is_empty());
    }
}

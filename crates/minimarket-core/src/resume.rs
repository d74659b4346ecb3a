//! # Continue-Sale Payload
//!
//! A committed sale can be reopened in the cart, changed, and committed
//! again as an update of the same sale.
//!
//! ```text
//! Sales list ──► stash(sale) ──► [ one-slot handoff ] ──► resume() ──► Cart
//!                                  consumed once                       │
//!                                                                      ▼
//!                                              checkout ──► reconcile sale
//! ```
//!
//! The payload carries the sale id, the cart lines and the payment method.
//! Line stock is shelf stock plus what the sale already holds, because those
//! units come back to the shelf if the line shrinks.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{Cart, CartLine};
use crate::error::CoreResult;
use crate::types::{PaymentMethod, Product, SaleDetail};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ContinueSalePayload {
    pub sale_id: String,
    pub lines: Vec<CartLine>,
    pub payment_method: PaymentMethod,
}

/// The sale a resumed cart will update on checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ResumedSale {
    pub sale_id: String,
    pub payment_method: PaymentMethod,
}

impl ContinueSalePayload {
    /// Builds the payload for a persisted sale.
    ///
    /// `products` is the current catalog row of each item's product. Items
    /// whose product is gone keep exactly their committed quantity as stock.
    pub fn from_sale(detail: &SaleDetail, products: &[Product]) -> Self {
        let now = Utc::now();
        let lines = detail
            .items
            .iter()
            .map(|item| {
                let product = products.iter().find(|p| p.id == item.product_id);
                let shelf = product.map(|p| p.stock).unwrap_or(0);
                CartLine {
                    product_id: item.product_id.clone(),
                    name: item.name_snapshot.clone(),
                    barcode: product.and_then(|p| p.barcode.clone()),
                    unit_price_cents: item.unit_price_cents,
                    quantity: item.quantity,
                    subtotal_cents: item.subtotal_cents,
                    stock: shelf + item.quantity,
                    added_at: now,
                }
            })
            .collect();

        ContinueSalePayload {
            sale_id: detail.sale.id.clone(),
            lines,
            payment_method: detail.sale.payment_method,
        }
    }

    /// Quantities the sale already took from stock, by product id.
    pub fn reserved(&self) -> HashMap<String, i64> {
        let mut reserved = HashMap::new();
        for line in &self.lines {
            *reserved.entry(line.product_id.clone()).or_insert(0) += line.quantity;
        }
        reserved
    }

    /// Seeds `cart` from the payload and returns the sale to update.
    ///
    /// On error the cart is left as it was.
    pub fn seed_cart(self, cart: &mut Cart) -> CoreResult<ResumedSale> {
        let reserved = self.reserved();
        cart.seed(self.lines, reserved)?;
        Ok(ResumedSale {
            sale_id: self.sale_id,
            payment_method: self.payment_method,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Sale, SaleItem, SaleStatus};

    fn detail() -> SaleDetail {
        let now = Utc::now();
        SaleDetail {
            sale: Sale {
                id: "s-1".to_string(),
                total_cents: 3400,
                payment_method: PaymentMethod::Card,
                status: SaleStatus::Completed,
                cashier_id: "u-1".to_string(),
                created_at: now,
                updated_at: now,
            },
            items: vec![
                SaleItem {
                    id: "i-1".to_string(),
                    sale_id: "s-1".to_string(),
                    product_id: "A".to_string(),
                    name_snapshot: "Rice 1kg".to_string(),
                    unit_price_cents: 1000,
                    quantity: 3,
                    subtotal_cents: 3000,
                    created_at: now,
                },
                SaleItem {
                    id: "i-2".to_string(),
                    sale_id: "s-1".to_string(),
                    product_id: "B".to_string(),
                    name_snapshot: "Matches".to_string(),
                    unit_price_cents: 200,
                    quantity: 2,
                    subtotal_cents: 400,
                    created_at: now,
                },
            ],
        }
    }

    fn shelf(id: &str, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: id.to_string(),
            barcode: Some(format!("{}0000", id)),
            category: None,
            price_cents: 9999,
            stock,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_payload_stock_includes_committed_quantity() {
        let payload = ContinueSalePayload::from_sale(&detail(), &[shelf("A", 2)]);

        assert_eq!(payload.sale_id, "s-1");
        assert_eq!(payload.payment_method, PaymentMethod::Card);
        assert_eq!(payload.lines[0].stock, 5);
        assert_eq!(payload.lines[0].barcode.as_deref(), Some("A0000"));
        // Product B no longer in the catalog
        assert_eq!(payload.lines[1].stock, 2);
        // Snapshot price wins over the current catalog price
        assert_eq!(payload.lines[0].unit_price_cents, 1000);
    }

    #[test]
    fn test_seed_cart_keeps_total_and_remembers_sale() {
        let payload = ContinueSalePayload::from_sale(&detail(), &[shelf("A", 0), shelf("B", 0)]);
        let mut cart = Cart::new();

        let resumed = payload.seed_cart(&mut cart).unwrap();

        assert_eq!(resumed.sale_id, "s-1");
        assert_eq!(cart.total().cents(), 3400);
        assert_eq!(cart.reserved_for("A"), 3);
        assert_eq!(cart.reserved_for("B"), 2);
    }

    #[test]
    fn test_payload_round_trips_through_json() {
        let payload = ContinueSalePayload::from_sale(&detail(), &[]);
        let json = serde_json::to_string(&payload).unwrap();

        assert!(json.contains("\"saleId\":\"s-1\""));
        assert!(json.contains("\"paymentMethod\":\"card\""));
        let back: ContinueSalePayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
    }
}

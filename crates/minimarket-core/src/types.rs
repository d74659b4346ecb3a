//! # Domain Types
//!
//! Core domain types used throughout Mini Market.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  sale_id (FK)   │       │
//! │  │  barcode        │   │  total_cents    │   │  product_id(FK) │       │
//! │  │  price_cents    │   │  status         │   │  quantity       │       │
//! │  │  stock (>= 0)   │   │  cashier_id(FK) │   │  unit_price     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Profile      │   │   SaleStatus    │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  full_name      │   │  Completed      │   │  Cash           │       │
//! │  │  role           │   │  Edited         │   │  Card           │       │
//! │  └─────────────────┘   └─────────────────┘   │  MobileMoney    │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A SaleItem copies the product name and unit price at commit time, so a
//! later price change never rewrites history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to the cashier and on the receipt.
    pub name: String,

    /// Barcode (EAN-13, UPC-A, etc.). Unique when present.
    pub barcode: Option<String>,

    /// Free-form shelf category ("Beverages", "Dairy", ...).
    pub category: Option<String>,

    /// Price in cents.
    pub price_cents: i64,

    /// On-hand quantity. Never negative.
    pub stock: i64,

    /// Whether the product is sellable (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether `quantity` units can be taken from the shelf.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.is_active && self.stock >= quantity
    }

    /// Whether stock has fallen to the given threshold.
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.stock <= threshold
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a persisted sale.
///
/// A cart that was never committed has no status; it is not a sale yet.
/// Deletion removes the row, so there is no terminal "deleted" value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Committed at checkout, stock applied.
    Completed,
    /// Items or total changed after commit, stock re-balanced.
    Edited,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Completed
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Mobile wallet transfer.
    MobileMoney,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::MobileMoney => "mobile_money",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" | "credit" | "debit" => Ok(PaymentMethod::Card),
            "mobile_money" | "mobile" | "transfer" => Ok(PaymentMethod::MobileMoney),
            _ => Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: vec!["cash".into(), "card".into(), "mobile_money".into()],
            }),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A persisted sale header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// Always the sum of the sale's item subtotals.
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    /// Profile that rang up the sale.
    pub cashier_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item of a persisted sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// unit_price_cents × quantity.
    pub subtotal_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// A sale together with its lines, as shown on a receipt or edit screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleDetail {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

impl SaleDetail {
    /// Sum of the item subtotals.
    pub fn items_total(&self) -> Money {
        self.items.iter().map(SaleItem::subtotal).sum()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

// =============================================================================
// Staff Profiles
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May edit and delete committed sales, manage users and settings.
    Admin,
    /// Rings up sales.
    Cashier,
}

impl Default for Role {
    fn default() -> Self {
        Role::Cashier
    }
}

/// A staff member. The password hash never leaves the database layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Profile {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Expenses
// =============================================================================

/// Money paid out of the till (rent, restock runs, utilities).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub category: Option<String>,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64) -> Product {
        Product {
            id: "p-1".to_string(),
            name: "Rice 1kg".to_string(),
            barcode: None,
            category: None,
            price_cents: 1000,
            stock,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_can_sell_respects_stock_and_active() {
        let mut p = product(3);
        assert!(p.can_sell(3));
        assert!(!p.can_sell(4));

        p.is_active = false;
        assert!(!p.can_sell(1));
    }

    #[test]
    fn test_low_stock_threshold_is_inclusive() {
        assert!(product(5).is_low_stock(5));
        assert!(!product(6).is_low_stock(5));
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!(" Debit ".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert_eq!(
            "mobile".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::MobileMoney
        );
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_payment_method_serializes_snake_case() {
        let json = serde_json::to_string(&PaymentMethod::MobileMoney).unwrap();
        assert_eq!(json, "\"mobile_money\"");
        assert_eq!(PaymentMethod::MobileMoney.to_string(), "mobile_money");
    }

    #[test]
    fn test_sale_status_default() {
        assert_eq!(SaleStatus::default(), SaleStatus::Completed);
    }
}

//! # minimarket-core: Pure Business Logic for Mini Market
//!
//! This crate holds the checkout rules of the shop as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Mini Market Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (apps/server)                       │   │
//! │  │    /api/cart, /api/checkout, /api/sales/{id}, ...              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ minimarket-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  types   │ │  money   │ │   cart   │ │    sale_edit     │  │   │
//! │  │   │ Product  │ │  Money   │ │   Cart   │ │  SaleEditPlan    │  │   │
//! │  │   │  Sale    │ │          │ │ CartLine │ │  reconcile diff  │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 minimarket-db (Database Layer)                  │   │
//! │  │        SQLite queries, migrations, transactional commits        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleItem, Profile, Expense)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - The cart engine: stock-bounded lines keyed by product
//! - [`resume`] - Continue-sale handoff payload
//! - [`sale_edit`] - Stock deltas for post-commit corrections and resumes
//! - [`settings`] - Store settings and currency formatting
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use minimarket_core::cart::Cart;
//! use minimarket_core::money::Money;
//! # use minimarket_core::types::Product;
//! # let product = Product {
//! #     id: "p-1".into(), name: "Rice 1kg".into(), barcode: None, category: None,
//! #     price_cents: 1000, stock: 5, is_active: true,
//! #     created_at: chrono::Utc::now(), updated_at: chrono::Utc::now(),
//! # };
//!
//! let mut cart = Cart::new();
//! for _ in 0..3 {
//!     cart.add_item(&product).unwrap();
//! }
//! assert_eq!(cart.total(), Money::from_cents(3000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod resume;
pub mod sale_edit;
pub mod settings;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, QuantityUpdate};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use resume::{ContinueSalePayload, ResumedSale};
pub use sale_edit::{EditLine, LineChange, SaleEdit, SaleEditPlan};
pub use settings::{SettingsPatch, StoreSettings};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (typing 1000 instead of 10) even when
/// the shelf count would allow it.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price accepted, in cents (1,000,000.00).
///
/// With MAX_ITEM_QUANTITY and MAX_CART_ITEMS this keeps every subtotal and
/// sale total far inside i64.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Highest stock level a product may hold.
pub const MAX_STOCK: i64 = 1_000_000;

/// Stock level at or below which a product shows up in the low-stock list
/// until the shop configures its own threshold.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

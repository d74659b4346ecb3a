//! # Routes
//!
//! HTTP handlers, one module per area. Each module is a thin layer: parse
//! the request, call the cart engine or a repository, map the result.
//!
//! ## Route Table
//! ```text
//! /api
//! ├── health, diagnostics             health.rs
//! ├── products/...                    products.rs
//! ├── cart/...                        cart.rs
//! ├── checkout, checkout/last|repeat  checkout.rs
//! ├── sales/...                       sales.rs
//! ├── expenses/...                    expenses.rs
//! ├── reports/summary                 reports.rs
//! ├── users/...                       users.rs
//! ├── settings, settings/refresh      settings.rs
//! └── backup, restore                 backup.rs
//! ```

pub mod backup;
pub mod cart;
pub mod checkout;
pub mod expenses;
pub mod health;
pub mod products;
pub mod reports;
pub mod sales;
pub mod settings;
pub mod users;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::state::AppState;

/// Every `/api` route, without state or middleware.
pub fn api() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/diagnostics", get(health::diagnostics))
        // Products
        .route("/products", get(products::list).post(products::create))
        .route("/products/low-stock", get(products::low_stock))
        .route("/products/barcode/{barcode}", get(products::by_barcode))
        .route(
            "/products/{id}",
            get(products::get).put(products::update).delete(products::remove),
        )
        .route("/products/{id}/stock", post(products::adjust_stock))
        // Cart
        .route("/cart", get(cart::get_cart).delete(cart::clear))
        .route("/cart/items", post(cart::add_item))
        .route(
            "/cart/items/{product_id}",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/cart/resume", post(cart::resume))
        // Checkout
        .route("/checkout", post(checkout::checkout))
        .route("/checkout/last", get(checkout::last_sale))
        .route("/checkout/repeat", post(checkout::repeat_last))
        // Sales
        .route("/sales", get(sales::list))
        .route(
            "/sales/{id}",
            get(sales::detail).put(sales::edit).delete(sales::remove),
        )
        .route("/sales/{id}/continue", post(sales::continue_sale))
        // Expenses
        .route("/expenses", get(expenses::list).post(expenses::create))
        .route("/expenses/{id}", delete(expenses::remove))
        // Reports
        .route("/reports/summary", get(reports::summary))
        // Users
        .route("/users", get(users::list).post(users::create))
        .route("/users/{id}", put(users::update).delete(users::remove))
        // Settings
        .route("/settings", get(settings::get).post(settings::save))
        .route("/settings/refresh", post(settings::refresh))
        // Backup
        .route("/backup", get(backup::download))
        .route("/restore", post(backup::restore))
}

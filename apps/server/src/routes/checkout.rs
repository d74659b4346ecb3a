//! # Checkout Routes
//!
//! Turns the session cart into a committed sale.
//!
//! ```text
//! POST /api/checkout
//!   │
//!   ├── cart.resumed = Some(sale) ──► commit_resumed (diff against sale)
//!   └── otherwise ──────────────────► commit_sale (new sale, cashier required)
//!   │
//!   ▼
//! cart cleared, receipt returned, last sale kept for reprint / repeat
//! ```
//!
//! The cart is copied out of the session before the database is touched; a
//! failed commit leaves the cart exactly as the cashier had it.

use std::collections::HashMap;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::routes::cart::{cart_response, CartResponse};
use crate::state::AppState;
use minimarket_core::{CartLine, CoreError, CoreResult, PaymentMethod, Product, SaleDetail};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
    /// Required for new sales. A resumed sale keeps its original cashier.
    #[serde(default)]
    pub cashier_id: Option<String>,
}

/// What the till prints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub sale: SaleDetail,
    pub store_name: String,
    pub formatted_total: String,
    pub footer: String,
}

async fn receipt(state: &AppState, sale: SaleDetail) -> Receipt {
    let settings = state.settings.get().await;
    Receipt {
        formatted_total: settings.format_currency(sale.sale.total_cents),
        store_name: settings.store_name,
        footer: settings.receipt_footer,
        sale,
    }
}

pub async fn checkout(
    State(state): State<AppState>,
    Json(input): Json<CheckoutRequest>,
) -> ApiResult<Json<Receipt>> {
    let (lines, resumed) = state
        .session
        .with_session(|s| (s.cart.lines().to_vec(), s.resumed.clone()));

    if lines.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }

    let checkout = state.db.checkout();
    let sale = match &resumed {
        Some(resumed) => {
            debug!(sale_id = %resumed.sale_id, "Checking out resumed sale");
            checkout
                .commit_resumed(&resumed.sale_id, &lines, input.payment_method)
                .await?
        }
        None => {
            checkout
                .commit_sale(&lines, input.payment_method, input.cashier_id.as_deref())
                .await?
        }
    };

    state.session.with_session_mut(|s| {
        s.reset();
        s.last_sale = Some(sale.clone());
    });

    info!(
        sale_id = %sale.sale.id,
        total_cents = sale.sale.total_cents,
        resumed = resumed.is_some(),
        "Checkout complete"
    );

    Ok(Json(receipt(&state, sale).await))
}

/// Reprints the most recent receipt of this session.
pub async fn last_sale(State(state): State<AppState>) -> ApiResult<Json<Receipt>> {
    let sale = state
        .session
        .with_session(|s| s.last_sale.clone())
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "No sale completed in this session"))?;

    Ok(Json(receipt(&state, sale).await))
}

/// Refills the cart with the items of the last sale at today's prices.
pub async fn repeat_last(State(state): State<AppState>) -> ApiResult<Json<CartResponse>> {
    let last = state
        .session
        .with_session(|s| s.last_sale.clone())
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "No sale completed in this session"))?;

    let ids: Vec<String> = last.items.iter().map(|i| i.product_id.clone()).collect();
    let products = state.db.products().get_many(&ids).await?;

    let lines = repeat_lines(&last, &products)?;
    if lines.is_empty() {
        return Err(ApiError::new(
            ErrorCode::CartError,
            "None of the last sale's products can be sold right now",
        ));
    }

    let count = lines.len();
    state.session.with_session_mut(|s| {
        s.cart.seed(lines, HashMap::new())?;
        s.resumed = None;
        Ok::<_, CoreError>(())
    })?;

    info!(sale_id = %last.sale.id, lines = count, "Last sale repeated into cart");
    Ok(Json(cart_response(&state).await))
}

/// Cart lines for a repeat of `sale`.
///
/// Uses current prices. Quantities are capped at the shelf; inactive and
/// sold-out products are skipped.
fn repeat_lines(sale: &SaleDetail, products: &[Product]) -> CoreResult<Vec<CartLine>> {
    let mut lines: Vec<CartLine> = Vec::new();

    for item in &sale.items {
        let Some(product) = products.iter().find(|p| p.id == item.product_id) else {
            continue;
        };
        if !product.is_active || product.stock < 1 {
            continue;
        }

        let wanted = match lines.iter().position(|l| l.product_id == product.id) {
            Some(idx) => lines.remove(idx).quantity + item.quantity,
            None => item.quantity,
        };

        let mut line = CartLine::from_product(product, product.stock);
        line.set_quantity(wanted.min(product.stock))?;
        lines.push(line);
    }

    Ok(lines)
}

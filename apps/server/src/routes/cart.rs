//! # Cart Routes
//!
//! The session cart of this terminal.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐                        │
//! │  │  Empty   │────►│ In Cart  │────►│ Checkout │──► sale committed      │
//! │  │  Cart    │     │          │     │          │    cart emptied        │
//! │  └──────────┘     └──────────┘     └──────────┘                        │
//! │       ▲                │                                                │
//! │       │           add / update / remove                                │
//! │       │                │                                                │
//! │       └──── clear ─────┘                                               │
//! │                                                                         │
//! │  resume: replaces the cart with a continued sale's lines               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, CheckoutSession};
use minimarket_core::{CartLine, CoreError, QuantityUpdate, ResumedSale};

/// Cart contents and totals as the checkout screen shows them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub lines: Vec<CartLine>,
    pub total_cents: i64,
    pub formatted_total: String,
    pub item_count: usize,
    pub total_quantity: i64,
    /// The committed sale this cart will update, when continuing one.
    pub resumed: Option<ResumedSale>,
}

impl CartResponse {
    fn snapshot(session: &CheckoutSession) -> Self {
        CartResponse {
            lines: session.cart.lines().to_vec(),
            total_cents: session.cart.total().cents(),
            formatted_total: String::new(),
            item_count: session.cart.item_count(),
            total_quantity: session.cart.total_quantity(),
            resumed: session.resumed.clone(),
        }
    }
}

/// Reads the cart, then formats the total outside the session lock.
pub(crate) async fn cart_response(state: &AppState) -> CartResponse {
    let mut response = state.session.with_session(CartResponse::snapshot);
    response.formatted_total = state.settings.format_currency(response.total_cents).await;
    response
}

pub async fn get_cart(State(state): State<AppState>) -> Json<CartResponse> {
    Json(cart_response(&state).await)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: Option<String>,
    /// Scanned barcode, used when no product id is given.
    pub barcode: Option<String>,
}

/// Adds one unit of a product, by id or scanned barcode.
pub async fn add_item(
    State(state): State<AppState>,
    Json(input): Json<AddItemRequest>,
) -> ApiResult<Json<CartResponse>> {
    let products = state.db.products();

    let product = match (&input.product_id, &input.barcode) {
        (Some(id), _) => products.require(id).await?,
        (None, Some(barcode)) => products
            .get_by_barcode(barcode)
            .await?
            .ok_or_else(|| ApiError::not_found("Product with barcode", barcode))?,
        (None, None) => return Err(ApiError::validation("productId or barcode is required")),
    };

    if !product.is_active {
        return Err(ApiError::validation("Product is not available for sale"));
    }

    debug!(product_id = %product.id, stock = product.stock, "Adding to cart");
    state
        .session
        .with_session_mut(|s| s.cart.add_item(&product))?;

    Ok(Json(cart_response(&state).await))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityResponse {
    pub outcome: QuantityUpdate,
    pub cart: CartResponse,
}

/// Sets a line's quantity. Below 1 is ignored; above stock is rejected.
pub async fn update_item(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Json(input): Json<UpdateQuantityRequest>,
) -> ApiResult<Json<UpdateQuantityResponse>> {
    // Check against the shelf as it is now, not as it was when added.
    let current = state.db.products().get_by_id(&product_id).await?;

    let outcome = state.session.with_session_mut(|s| {
        if let Some(product) = &current {
            s.cart.refresh_stock(product)?;
        }
        s.cart.update_quantity(&product_id, input.quantity)
    })?;

    if outcome == QuantityUpdate::Ignored {
        debug!(product_id = %product_id, quantity = input.quantity, "Quantity below 1 ignored");
    }

    Ok(Json(UpdateQuantityResponse {
        outcome,
        cart: cart_response(&state).await,
    }))
}

pub async fn remove_item(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Json<CartResponse> {
    state
        .session
        .with_session_mut(|s| s.cart.remove_item(&product_id));
    Json(cart_response(&state).await)
}

/// Empties the cart and abandons any continued sale.
pub async fn clear(State(state): State<AppState>) -> Json<CartResponse> {
    state.session.with_session_mut(CheckoutSession::reset);
    Json(cart_response(&state).await)
}

/// Loads the stashed continue-sale payload into the cart.
pub async fn resume(State(state): State<AppState>) -> ApiResult<Json<CartResponse>> {
    let payload = state.resume.take().ok_or(CoreError::NothingToResume)?;
    let fallback = payload.clone();

    let seeded = state.session.with_session_mut(|s| {
        let resumed = payload.seed_cart(&mut s.cart)?;
        s.resumed = Some(resumed.clone());
        Ok::<_, CoreError>(resumed)
    });

    match seeded {
        Ok(resumed) => {
            info!(sale_id = %resumed.sale_id, "Sale resumed into cart");
            Ok(Json(cart_response(&state).await))
        }
        Err(e) => {
            // Keep the payload so the cashier can retry after fixing the cart.
            state.resume.stash(fallback);
            Err(e.into())
        }
    }
}

//! # Product Routes
//!
//! Catalog lookup for the checkout screen and catalog maintenance for the
//! back office. Stock changes made here are pushed into the session cart's
//! known stock so the next quantity change sees them.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use minimarket_core::Product;
use minimarket_db::{NewProduct, ProductUpdate};

/// Default page size of the product list.
const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 500;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    /// Matches name, barcode or category. Empty lists everything.
    #[serde(default)]
    pub q: String,
    pub limit: Option<u32>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let products = state.db.products().search(&query.q, limit).await?;
    Ok(Json(products))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Product>> {
    Ok(Json(state.db.products().require(&id).await?))
}

pub async fn by_barcode(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> ApiResult<Json<Product>> {
    state
        .db
        .products()
        .get_by_barcode(&barcode)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product with barcode", &barcode))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = state.db.products().insert(&input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ProductUpdate>,
) -> ApiResult<Json<Product>> {
    let product = state.db.products().update(&id, &input).await?;
    sync_cart_stock(&state, &product);
    Ok(Json(product))
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.products().soft_delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub delta: i64,
}

pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<StockAdjustment>,
) -> ApiResult<Json<Product>> {
    let product = state.db.products().adjust_stock(&id, input.delta).await?;
    sync_cart_stock(&state, &product);
    Ok(Json(product))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockQuery {
    /// Overrides the store's configured threshold.
    pub threshold: Option<i64>,
}

pub async fn low_stock(
    State(state): State<AppState>,
    Query(query): Query<LowStockQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let threshold = match query.threshold {
        Some(t) => {
            minimarket_core::validation::validate_low_stock_threshold(t)?;
            t
        }
        None => state.settings.low_stock_threshold().await,
    };

    Ok(Json(state.db.products().low_stock(threshold).await?))
}

fn sync_cart_stock(state: &AppState, product: &Product) {
    match state
        .session
        .with_session_mut(|s| s.cart.refresh_stock(product))
    {
        Ok(true) => {
            debug!(product_id = %product.id, stock = product.stock, "Cart line stock refreshed")
        }
        Ok(false) => {}
        Err(e) => warn!(product_id = %product.id, error = %e, "Cart line stock not refreshed"),
    }
}

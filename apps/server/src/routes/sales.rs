//! # Sales Routes
//!
//! Back-office view of committed sales: list, detail, admin edit, delete,
//! and "continue sale" which hands a sale back to the checkout screen.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::{debug, info};

use crate::error::ApiResult;
use crate::state::AppState;
use minimarket_core::{ContinueSalePayload, Sale, SaleDetail, SaleEdit};
use minimarket_db::SaleFilter;

/// Newest first. Accepts `from`, `to`, `cashierId` and `limit`.
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<SaleFilter>,
) -> ApiResult<Json<Vec<Sale>>> {
    let sales = state.db.sales().list(&filter).await?;
    Ok(Json(sales))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleDetail>> {
    let detail = state.db.sales().get_detail(&id).await?;
    Ok(Json(detail))
}

/// Applies quantity changes and removals; stock follows the difference.
pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(edit): Json<SaleEdit>,
) -> ApiResult<Json<SaleDetail>> {
    let detail = state.db.checkout().edit_sale(&id, &edit).await?;
    Ok(Json(detail))
}

/// Deletes the sale and puts its items back on the shelf.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.checkout().delete_sale(&id).await?;

    // A cart still pointing at the deleted sale could never commit.
    state.session.with_session_mut(|s| {
        if s.resumed.as_ref().is_some_and(|r| r.sale_id == id) {
            s.reset();
        }
    });
    if state.resume.take_if(&id).is_some() {
        debug!(sale_id = %id, "Pending continue-sale dropped");
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Stashes the sale for the checkout screen to pick up with
/// `POST /api/cart/resume`. Replaces anything stashed before.
pub async fn continue_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ContinueSalePayload>> {
    let detail = state.db.sales().get_detail(&id).await?;

    let ids: Vec<String> = detail.items.iter().map(|i| i.product_id.clone()).collect();
    let products = state.db.products().get_many(&ids).await?;

    let payload = ContinueSalePayload::from_sale(&detail, &products);
    state.resume.stash(payload.clone());

    info!(sale_id = %id, lines = payload.lines.len(), "Sale stashed for continuation");
    Ok(Json(payload))
}

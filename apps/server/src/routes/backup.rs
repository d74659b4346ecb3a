//! # Backup Routes
//!
//! ```text
//! GET  /api/backup          ──► Snapshot (JSON, every table)
//! POST /api/restore         ◄── Snapshot; replaces all data in one transaction
//! ```
//!
//! A restore invalidates whatever the session remembered, so the cart,
//! resume slot and last sale are dropped and settings are reloaded.

use axum::extract::State;
use axum::Json;
use tracing::{info, warn};

use crate::error::ApiResult;
use crate::state::AppState;
use minimarket_db::{RestoreSummary, Snapshot};

pub async fn download(State(state): State<AppState>) -> ApiResult<Json<Snapshot>> {
    let snapshot = state.db.backup().snapshot().await?;
    info!(
        products = snapshot.products.len(),
        sales = snapshot.sales.len(),
        "Backup taken"
    );
    Ok(Json(snapshot))
}

pub async fn restore(
    State(state): State<AppState>,
    Json(snapshot): Json<Snapshot>,
) -> ApiResult<Json<RestoreSummary>> {
    warn!(created_at = %snapshot.created_at, "Restoring backup over current data");

    let summary = state.db.backup().restore(&snapshot).await?;

    state.session.with_session_mut(|s| {
        s.reset();
        s.last_sale = None;
    });
    state.resume.take();
    state.settings.refresh(&state.db).await?;

    info!(?summary, "Backup restored");
    Ok(Json(summary))
}

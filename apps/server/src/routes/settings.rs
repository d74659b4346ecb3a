//! # Settings Routes
//!
//! The cached copy in [`crate::state::SettingsState`] only changes after the
//! database accepted the write. A save only touches the keys in the body.

use axum::extract::State;
use axum::Json;
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;
use minimarket_core::{SettingsPatch, StoreSettings};

pub async fn get(State(state): State<AppState>) -> Json<StoreSettings> {
    Json(state.settings.get().await)
}

pub async fn save(
    State(state): State<AppState>,
    Json(input): Json<SettingsPatch>,
) -> ApiResult<Json<StoreSettings>> {
    let saved = state.settings.patch(&state.db, input).await?;
    info!(store_name = %saved.store_name, "Store settings saved");
    Ok(Json(saved))
}

/// Reloads settings written by another process.
pub async fn refresh(State(state): State<AppState>) -> ApiResult<Json<StoreSettings>> {
    let fresh = state.settings.refresh(&state.db).await?;
    Ok(Json(fresh))
}

//! # User Routes
//!
//! Staff profiles. Password hashes never leave the database layer.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::ApiResult;
use crate::state::AppState;
use minimarket_core::Profile;
use minimarket_db::{NewProfile, ProfileUpdate};

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Profile>>> {
    let profiles = state.db.profiles().list().await?;
    Ok(Json(profiles))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewProfile>,
) -> ApiResult<(StatusCode, Json<Profile>)> {
    let profile = state.db.profiles().create(&input).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ProfileUpdate>,
) -> ApiResult<Json<Profile>> {
    let profile = state.db.profiles().update(&id, &input).await?;
    Ok(Json(profile))
}

/// Fails with a conflict while sales still reference the profile;
/// deactivate it instead.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.profiles().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

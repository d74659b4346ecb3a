//! # Expense Routes

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::ApiResult;
use crate::state::AppState;
use minimarket_core::Expense;
use minimarket_db::{DateRange, NewExpense};

pub async fn list(
    State(state): State<AppState>,
    Query(range): Query<DateRange>,
) -> ApiResult<Json<Vec<Expense>>> {
    let expenses = state.db.expenses().list(range).await?;
    Ok(Json(expenses))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewExpense>,
) -> ApiResult<(StatusCode, Json<Expense>)> {
    let expense = state.db.expenses().create(&input).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.expenses().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

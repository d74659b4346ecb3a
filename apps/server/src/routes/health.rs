//! Liveness and diagnostics.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::AppState;
use minimarket_db::MigrationStatus;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
}

/// `200 ok` when the database answers, `503 degraded` otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;

    let (status, label) = if database {
        (StatusCode::OK, "ok")
    } else {
        tracing::warn!("Health check: database unreachable");
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (status, Json(HealthResponse { status: label, database }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub version: &'static str,
    pub database_path: String,
    pub migrations: MigrationStatus,
    pub product_count: i64,
    pub sale_count: i64,
    pub profile_count: i64,
    pub pending_resume: Option<String>,
}

pub async fn diagnostics(State(state): State<AppState>) -> ApiResult<Json<Diagnostics>> {
    let db = &state.db;

    Ok(Json(Diagnostics {
        version: env!("CARGO_PKG_VERSION"),
        database_path: db.path().display().to_string(),
        migrations: db.migration_status().await?,
        product_count: db.products().count().await?,
        sale_count: db.sales().count().await?,
        profile_count: db.profiles().count().await?,
        pending_resume: state.resume.peek_sale_id(),
    }))
}

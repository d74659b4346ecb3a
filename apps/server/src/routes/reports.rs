//! # Report Routes

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use chrono::{DateTime, Utc};
use minimarket_db::{DateRange, SummaryReport, TopProduct, DEFAULT_TOP_PRODUCTS};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Length of the best sellers list.
    pub top: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    #[serde(flatten)]
    pub summary: SummaryReport,
    pub formatted_net: String,
    pub top_products: Vec<TopProduct>,
}

pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<ReportResponse>> {
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from >= to {
            return Err(ApiError::validation("`from` must be before `to`"));
        }
    }

    let range = DateRange {
        from: query.from,
        to: query.to,
    };
    let reports = state.db.reports();
    let summary = reports.summary(range).await?;
    let top_products = reports
        .top_products(range, query.top.unwrap_or(DEFAULT_TOP_PRODUCTS).clamp(1, 100))
        .await?;

    Ok(Json(ReportResponse {
        formatted_net: state.settings.format_currency(summary.net_cents).await,
        summary,
        top_products,
    }))
}

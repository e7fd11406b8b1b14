//! Period cost endpoint.

use crate::aggregation::{self, AggregationWindow};
use crate::dtos::{build_filter, non_blank, parse_month, ErrorResponse, TotalQuery, TotalResponse};
use crate::handlers::observe_error;
use crate::models::{months_inclusive, SubscriptionFilter};
use crate::services::record_aggregation;
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use service_core::error::AppError;

fn filter_label(filter: &SubscriptionFilter) -> &'static str {
    match (filter.user_id.is_some(), filter.service_name.is_some()) {
        (false, false) => "none",
        (true, false) => "user",
        (false, true) => "service",
        (true, true) => "user_and_service",
    }
}

/// Total cost of matching subscriptions over an inclusive range of months
#[utoipa::path(
    get,
    path = "/api/subscriptions/total",
    params(TotalQuery),
    responses(
        (status = 200, description = "Total cost for the period", body = TotalResponse),
        (status = 400, description = "Missing or invalid parameters", body = ErrorResponse),
        (status = 504, description = "Store deadline exceeded", body = ErrorResponse)
    ),
    tag = "Aggregation"
)]
pub async fn total_cost(
    State(state): State<AppState>,
    Query(query): Query<TotalQuery>,
) -> Result<Json<TotalResponse>, AppError> {
    let (Some(start), Some(end)) = (
        non_blank(query.start_date.as_deref()),
        non_blank(query.end_date.as_deref()),
    ) else {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "start_date and end_date required"
        )));
    };

    let window = AggregationWindow::new(
        parse_month(start, "start_date")?,
        parse_month(end, "end_date")?,
    );
    let filter = build_filter(query.user_id.as_deref(), query.service_name.as_deref())?;

    let total = aggregation::total_cost(state.store.as_ref(), &filter, window, state.query_timeout)
        .await
        .map_err(observe_error("total_cost"))?;

    let window_months = if window.is_degenerate() {
        0
    } else {
        months_inclusive(window.start, window.end)
    };
    record_aggregation(filter_label(&filter), window_months);

    Ok(Json(TotalResponse {
        total,
        period_start: window.start.to_string(),
        period_end: window.end.to_string(),
    }))
}

//! CRUD handlers for `/api/subscriptions`.

use crate::dtos::{
    parse_uuid, ErrorResponse, ListQuery, SubscriptionRequest, SubscriptionResponse,
};
use crate::handlers::observe_error;
use crate::services::{record_subscription_operation, with_deadline};
use crate::utils::ValidatedJson;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use tracing::info;

fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("not found"))
}

/// Create a subscription
#[utoipa::path(
    post,
    path = "/api/subscriptions",
    request_body = SubscriptionRequest,
    responses(
        (status = 201, description = "Subscription created", body = SubscriptionResponse),
        (status = 400, description = "Malformed or invalid payload", body = ErrorResponse),
        (status = 422, description = "Payload failed validation", body = ErrorResponse),
        (status = 504, description = "Store deadline exceeded", body = ErrorResponse)
    ),
    tag = "Subscriptions"
)]
pub async fn create_subscription(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SubscriptionRequest>,
) -> Result<(StatusCode, Json<SubscriptionResponse>), AppError> {
    let input = req.into_input().map_err(observe_error("create_subscription"))?;

    let subscription = with_deadline(
        state.query_timeout,
        "create_subscription",
        state.store.create_subscription(&input),
    )
    .await
    .map_err(observe_error("create_subscription"))?;

    record_subscription_operation("create");
    info!(
        subscription_id = %subscription.subscription_id,
        user_id = %subscription.user_id,
        service_name = %subscription.service_name,
        "Subscription created"
    );

    Ok((StatusCode::CREATED, Json(subscription.into())))
}

/// Get a subscription by id
#[utoipa::path(
    get,
    path = "/api/subscriptions/{id}",
    params(("id" = String, Path, description = "Subscription id")),
    responses(
        (status = 200, description = "Subscription found", body = SubscriptionResponse),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 404, description = "Subscription not found", body = ErrorResponse)
    ),
    tag = "Subscriptions"
)]
pub async fn get_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let subscription_id = parse_uuid(&id, "id")?;

    let subscription = with_deadline(
        state.query_timeout,
        "get_subscription",
        state.store.get_subscription(subscription_id),
    )
    .await
    .map_err(observe_error("get_subscription"))?
    .ok_or_else(not_found)?;

    record_subscription_operation("get");

    Ok(Json(subscription.into()))
}

/// Replace a subscription's fields
#[utoipa::path(
    put,
    path = "/api/subscriptions/{id}",
    params(("id" = String, Path, description = "Subscription id")),
    request_body = SubscriptionRequest,
    responses(
        (status = 200, description = "Subscription updated", body = SubscriptionResponse),
        (status = 400, description = "Invalid id or payload", body = ErrorResponse),
        (status = 404, description = "Subscription not found", body = ErrorResponse),
        (status = 422, description = "Payload failed validation", body = ErrorResponse)
    ),
    tag = "Subscriptions"
)]
pub async fn update_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<SubscriptionRequest>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let subscription_id = parse_uuid(&id, "id")?;
    let input = req.into_input().map_err(observe_error("update_subscription"))?;

    let subscription = with_deadline(
        state.query_timeout,
        "update_subscription",
        state.store.update_subscription(subscription_id, &input),
    )
    .await
    .map_err(observe_error("update_subscription"))?
    .ok_or_else(not_found)?;

    record_subscription_operation("update");
    info!(subscription_id = %subscription_id, "Subscription updated");

    Ok(Json(subscription.into()))
}

/// Delete a subscription
#[utoipa::path(
    delete,
    path = "/api/subscriptions/{id}",
    params(("id" = String, Path, description = "Subscription id")),
    responses(
        (status = 204, description = "Subscription deleted"),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 404, description = "Subscription not found", body = ErrorResponse)
    ),
    tag = "Subscriptions"
)]
pub async fn delete_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let subscription_id = parse_uuid(&id, "id")?;

    let deleted = with_deadline(
        state.query_timeout,
        "delete_subscription",
        state.store.delete_subscription(subscription_id),
    )
    .await
    .map_err(observe_error("delete_subscription"))?;

    if !deleted {
        return Err(not_found());
    }

    record_subscription_operation("delete");
    info!(subscription_id = %subscription_id, "Subscription deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// List subscriptions, optionally filtered by user and service
#[utoipa::path(
    get,
    path = "/api/subscriptions",
    params(ListQuery),
    responses(
        (status = 200, description = "Matching subscriptions, newest first", body = [SubscriptionResponse]),
        (status = 400, description = "Invalid user_id", body = ErrorResponse)
    ),
    tag = "Subscriptions"
)]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<SubscriptionResponse>>, AppError> {
    let filter = query.into_filter()?;

    let subscriptions = with_deadline(
        state.query_timeout,
        "list_subscriptions",
        state.store.list_subscriptions(&filter),
    )
    .await
    .map_err(observe_error("list_subscriptions"))?;

    record_subscription_operation("list");

    Ok(Json(
        subscriptions
            .into_iter()
            .map(SubscriptionResponse::from)
            .collect(),
    ))
}

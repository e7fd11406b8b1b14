//! Subscription Service - subscription tracking and period cost aggregation.

pub mod aggregation;
pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Json, Router,
};
use service_core::middleware::{metrics_middleware, request_id_middleware, request_id_of};
use services::SubscriptionStore;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health_check,
        handlers::subscriptions::create_subscription,
        handlers::subscriptions::get_subscription,
        handlers::subscriptions::update_subscription,
        handlers::subscriptions::delete_subscription,
        handlers::subscriptions::list_subscriptions,
        handlers::aggregation::total_cost,
    ),
    components(
        schemas(
            dtos::SubscriptionRequest,
            dtos::SubscriptionResponse,
            dtos::TotalResponse,
            dtos::ErrorResponse,
        )
    ),
    tags(
        (name = "Subscriptions", description = "Subscription records"),
        (name = "Aggregation", description = "Cost over a period of months"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SubscriptionStore>,
    /// Deadline applied to every store call made for a request.
    pub query_timeout: Duration,
}

impl AppState {
    pub fn new(store: Arc<dyn SubscriptionStore>, query_timeout: Duration) -> Self {
        Self {
            store,
            query_timeout,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route(
            "/api/subscriptions",
            post(handlers::subscriptions::create_subscription)
                .get(handlers::subscriptions::list_subscriptions),
        )
        .route(
            "/api/subscriptions/total",
            get(handlers::aggregation::total_cost),
        )
        .route(
            "/api/subscriptions/:id",
            get(handlers::subscriptions::get_subscription)
                .put(handlers::subscriptions::update_subscription)
                .delete(handlers::subscriptions::delete_subscription),
        )
        .route_layer(from_fn(metrics_middleware))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    request_id = %request_id_of(request),
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
}

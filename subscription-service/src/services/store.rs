//! Storage seam for subscriptions.

use crate::aggregation::AggregationWindow;
use crate::models::{Subscription, SubscriptionFilter, SubscriptionInput};
use async_trait::async_trait;
use service_core::error::AppError;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

/// Persistence operations the HTTP layer and the aggregation engine rely on.
///
/// `list_overlapping` must return every subscription matching `filter` whose
/// lifetime overlaps `window` (`start_date <= window.end` and
/// `end_date IS NULL OR end_date >= window.start`). Returning extra rows is
/// allowed; omitting an overlapping row is not.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn create_subscription(&self, input: &SubscriptionInput)
        -> Result<Subscription, AppError>;

    async fn get_subscription(&self, subscription_id: Uuid)
        -> Result<Option<Subscription>, AppError>;

    /// Replace the mutable fields. Returns `None` when no such subscription exists.
    async fn update_subscription(
        &self,
        subscription_id: Uuid,
        input: &SubscriptionInput,
    ) -> Result<Option<Subscription>, AppError>;

    /// Returns `false` when no such subscription exists.
    async fn delete_subscription(&self, subscription_id: Uuid) -> Result<bool, AppError>;

    async fn list_subscriptions(
        &self,
        filter: &SubscriptionFilter,
    ) -> Result<Vec<Subscription>, AppError>;

    async fn list_overlapping(
        &self,
        filter: &SubscriptionFilter,
        window: &AggregationWindow,
    ) -> Result<Vec<Subscription>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

/// Run a store call with a deadline, mapping expiry to [`AppError::Timeout`].
pub async fn with_deadline<T, F>(
    deadline: Duration,
    operation: &str,
    call: F,
) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                operation = operation,
                deadline_ms = deadline.as_millis() as u64,
                "Store call exceeded deadline"
            );
            Err(AppError::Timeout(anyhow::anyhow!(
                "{} exceeded {}ms",
                operation,
                deadline.as_millis()
            )))
        }
    }
}

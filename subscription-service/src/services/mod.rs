//! Services module for subscription-service.

pub mod database;
pub mod metrics;
pub mod store;

pub use database::Database;
pub use metrics::{
    get_metrics, init_metrics, record_aggregation, record_error, record_subscription_operation,
};
pub use store::{with_deadline, SubscriptionStore};

//! Domain models for subscription-service.

mod month;
mod subscription;

pub use month::{months_inclusive, MonthYear, MonthYearError};
pub use subscription::{Subscription, SubscriptionFilter, SubscriptionInput};

//! Subscription model.

use super::MonthYear;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A user's recurring subscription to a service.
///
/// `start_date` and `end_date` are always the first day of their month.
/// A missing `end_date` means the subscription is still active.
#[derive(Debug, Clone, FromRow)]
pub struct Subscription {
    pub subscription_id: Uuid,
    pub service_name: String,
    pub price: i32,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Subscription {
    pub fn start_month(&self) -> MonthYear {
        MonthYear::from_date(self.start_date)
    }

    pub fn end_month(&self) -> Option<MonthYear> {
        self.end_date.map(MonthYear::from_date)
    }
}

/// Validated input for creating or replacing a subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionInput {
    pub service_name: String,
    pub price: i32,
    pub user_id: Uuid,
    pub start: MonthYear,
    pub end: Option<MonthYear>,
}

/// Optional equality filters, ANDed when both are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFilter {
    pub user_id: Option<Uuid>,
    pub service_name: Option<String>,
}

impl SubscriptionFilter {
    pub fn matches(&self, subscription: &Subscription) -> bool {
        self.user_id.map_or(true, |id| subscription.user_id == id)
            && self
                .service_name
                .as_deref()
                .map_or(true, |name| subscription.service_name == name)
    }
}

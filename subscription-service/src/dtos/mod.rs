//! Request and response bodies for the REST API.

use crate::models::{MonthYear, Subscription, SubscriptionFilter, SubscriptionInput};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "invalid id")]
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubscriptionRequest {
    #[validate(length(min = 1, max = 255, message = "service_name must be 1-255 characters"))]
    #[schema(example = "Yandex Plus")]
    pub service_name: String,

    #[validate(range(min = 0, message = "price must be >= 0"))]
    #[schema(example = 400, minimum = 0)]
    pub price: i32,

    #[schema(example = "60601fee-2bf1-4721-ae6f-7636e79a0cba")]
    pub user_id: String,

    #[schema(example = "07-2025")]
    pub start_date: String,

    /// Empty or missing means the subscription is still active.
    #[serde(default)]
    #[schema(example = "12-2025")]
    pub end_date: Option<String>,
}

impl SubscriptionRequest {
    /// Normalize the payload into a storable subscription.
    ///
    /// Expects a payload that already passed `validate()`.
    pub fn into_input(self) -> Result<SubscriptionInput, AppError> {
        let service_name = self.service_name.trim().to_string();
        if service_name.is_empty() {
            return Err(bad_request("service_name is required"));
        }

        let user_id = parse_uuid(&self.user_id, "user_id")?;
        let start = parse_month(&self.start_date, "start_date")?;

        let end = match self.end_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let end = parse_month(raw, "end_date")?;
                if end < start {
                    return Err(bad_request("end_date before start_date"));
                }
                Some(end)
            }
        };

        Ok(SubscriptionInput {
            service_name,
            price: self.price,
            user_id,
            start,
            end,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    #[schema(example = "2d0c3c52-5b55-4f1d-9f0a-8b8b2bb3f0e1")]
    pub id: Uuid,
    #[schema(example = "Yandex Plus")]
    pub service_name: String,
    #[schema(example = 400)]
    pub price: i32,
    pub user_id: Uuid,
    #[schema(example = "07-2025")]
    pub start_date: String,
    /// Empty string when open-ended.
    #[schema(example = "")]
    pub end_date: String,
    #[schema(example = "2025-07-14T09:30:00Z")]
    pub created_at: String,
    #[schema(example = "2025-07-14T09:30:00Z")]
    pub updated_at: String,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(subscription: Subscription) -> Self {
        Self {
            id: subscription.subscription_id,
            start_date: subscription.start_month().to_string(),
            end_date: subscription
                .end_month()
                .map(|end| end.to_string())
                .unwrap_or_default(),
            created_at: subscription
                .created_utc
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            updated_at: subscription
                .updated_utc
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            service_name: subscription.service_name,
            price: subscription.price,
            user_id: subscription.user_id,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Only subscriptions owned by this user
    pub user_id: Option<String>,
    /// Only subscriptions with this exact service name
    pub service_name: Option<String>,
}

impl ListQuery {
    pub fn into_filter(self) -> Result<SubscriptionFilter, AppError> {
        build_filter(self.user_id.as_deref(), self.service_name.as_deref())
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TotalQuery {
    /// First month of the period, `MM-YYYY`
    pub start_date: Option<String>,
    /// Last month of the period, `MM-YYYY`
    pub end_date: Option<String>,
    pub user_id: Option<String>,
    pub service_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TotalResponse {
    #[schema(example = 1800)]
    pub total: i64,
    #[schema(example = "01-2025")]
    pub period_start: String,
    #[schema(example = "03-2025")]
    pub period_end: String,
}

/// Blank values are treated as absent.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn build_filter(
    user_id: Option<&str>,
    service_name: Option<&str>,
) -> Result<SubscriptionFilter, AppError> {
    let user_id = non_blank(user_id)
        .map(|raw| parse_uuid(raw, "user_id"))
        .transpose()?;

    Ok(SubscriptionFilter {
        user_id,
        service_name: non_blank(service_name).map(str::to_string),
    })
}

pub fn parse_month(raw: &str, field: &str) -> Result<MonthYear, AppError> {
    MonthYear::parse(raw).map_err(|e| bad_request(&format!("invalid {}: {}", field, e)))
}

pub fn parse_uuid(raw: &str, field: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| bad_request(&format!("invalid {}", field)))
}

fn bad_request(message: &str) -> AppError {
    AppError::BadRequest(anyhow::anyhow!("{}", message))
}

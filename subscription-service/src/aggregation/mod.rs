//! Period-overlap aggregation.
//!
//! Given candidate subscriptions and a window of months, each subscription is
//! clamped to the window and contributes `price * active months`. The store may
//! return more candidates than truly overlap; the clamp re-checks every one.

use crate::models::{months_inclusive, MonthYear, Subscription, SubscriptionFilter};
use crate::services::{with_deadline, SubscriptionStore};
use service_core::error::AppError;
use std::time::Duration;
use tracing::{debug, instrument};

/// Inclusive range of months to aggregate over.
///
/// The window is not validated: `end < start` is allowed and yields no overlap
/// for any subscription, so the total is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationWindow {
    pub start: MonthYear,
    pub end: MonthYear,
}

impl AggregationWindow {
    pub fn new(start: MonthYear, end: MonthYear) -> Self {
        Self { start, end }
    }

    pub fn is_degenerate(&self) -> bool {
        self.end < self.start
    }
}

/// Months a subscription running from `start` to `end` (open-ended when `None`)
/// is active inside `window`, or `None` when the two do not overlap.
pub fn active_months(
    start: MonthYear,
    end: Option<MonthYear>,
    window: &AggregationWindow,
) -> Option<i64> {
    let active_start = start.max(window.start);
    let active_end = end.map_or(window.end, |end| end.min(window.end));

    if active_end < active_start {
        return None;
    }

    Some(months_inclusive(active_start, active_end))
}

/// Cost of one subscription inside the window.
pub fn contribution(subscription: &Subscription, window: &AggregationWindow) -> i64 {
    active_months(subscription.start_month(), subscription.end_month(), window)
        .map_or(0, |months| months * i64::from(subscription.price))
}

/// Sum of every candidate's contribution. Pure and order-independent.
pub fn aggregate_total<'a, I>(candidates: I, window: &AggregationWindow) -> i64
where
    I: IntoIterator<Item = &'a Subscription>,
{
    candidates
        .into_iter()
        .map(|subscription| contribution(subscription, window))
        .sum()
}

/// Fetch overlapping subscriptions from `store` and aggregate them.
///
/// Only the fetch is bounded by `deadline`; once candidates are in memory the
/// aggregation always runs to completion.
#[instrument(skip(store, filter, window), fields(start = %window.start, end = %window.end))]
pub async fn total_cost(
    store: &dyn SubscriptionStore,
    filter: &SubscriptionFilter,
    window: AggregationWindow,
    deadline: Duration,
) -> Result<i64, AppError> {
    let candidates = with_deadline(
        deadline,
        "list_overlapping",
        store.list_overlapping(filter, &window),
    )
    .await?;

    let total = aggregate_total(&candidates, &window);

    debug!(
        candidates = candidates.len(),
        total = total,
        degenerate = window.is_degenerate(),
        "Aggregated subscription cost"
    );

    Ok(total)
}

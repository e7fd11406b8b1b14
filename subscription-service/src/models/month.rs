//! Calendar month value.
//!
//! Subscriptions are billed per whole month, so every date that reaches the
//! aggregation engine is truncated to the first day of its month. `MonthYear`
//! carries that invariant in the type: it can only hold day 1 of a month.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Years at or below this bound are rejected by [`MonthYear::parse`].
const YEAR_LOWER_BOUND: i32 = 1900;
/// Years at or above this bound are rejected by [`MonthYear::parse`].
const YEAR_UPPER_BOUND: i32 = 2500;

/// Reasons a `MM-YYYY` string is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MonthYearError {
    #[error("invalid date format, expected MM-YYYY")]
    InvalidFormat,
    #[error("invalid month")]
    InvalidMonth,
    #[error("invalid year")]
    InvalidYear,
    #[error("month must be between 01 and 12")]
    MonthOutOfRange,
    #[error("year out of range")]
    YearOutOfRange,
}

/// A calendar month, stored as the first day of that month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthYear(NaiveDate);

impl MonthYear {
    /// Build a month from its year and 1-based month number.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// Truncate any date to its month.
    pub fn from_date(date: NaiveDate) -> Self {
        // Day 1 exists for every month chrono can represent.
        Self(date.with_day(1).unwrap_or(date))
    }

    /// Parse the human-facing `MM-YYYY` form, e.g. `07-2025`.
    pub fn parse(input: &str) -> Result<Self, MonthYearError> {
        let mut parts = input.trim().split('-');
        let (Some(month), Some(year), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(MonthYearError::InvalidFormat);
        };

        let month: i32 = month.parse().map_err(|_| MonthYearError::InvalidMonth)?;
        let year: i32 = year.parse().map_err(|_| MonthYearError::InvalidYear)?;

        if !(1..=12).contains(&month) {
            return Err(MonthYearError::MonthOutOfRange);
        }
        if year <= YEAR_LOWER_BOUND || year >= YEAR_UPPER_BOUND {
            return Err(MonthYearError::YearOutOfRange);
        }

        Self::new(year, month as u32).ok_or(MonthYearError::InvalidFormat)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// The storage representation: day 1 of the month.
    pub fn first_day(&self) -> NaiveDate {
        self.0
    }
}

/// Number of calendar months from `start` to `end`, counting both endpoints.
///
/// Only meaningful when `start <= end`; callers must check ordering first.
pub fn months_inclusive(start: MonthYear, end: MonthYear) -> i64 {
    let years = i64::from(end.year()) - i64::from(start.year());
    let months = i64::from(end.month()) - i64::from(start.month());
    years * 12 + months + 1
}

impl From<NaiveDate> for MonthYear {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}

impl FromStr for MonthYear {
    type Err = MonthYearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.month(), self.year())
    }
}

impl Serialize for MonthYear {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthYear {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(year: i32, month: u32) -> MonthYear {
        MonthYear::new(year, month).unwrap()
    }

    #[test]
    fn test_parse_valid_months() {
        assert_eq!(MonthYear::parse("01-2025").unwrap(), month(2025, 1));
        assert_eq!(MonthYear::parse("12-2024").unwrap(), month(2024, 12));
        assert_eq!(MonthYear::parse(" 07-2025 ").unwrap(), month(2025, 7));
    }

    #[test]
    fn test_parse_normalizes_to_first_day() {
        let parsed = MonthYear::parse("07-2025").unwrap();
        assert_eq!(
            parsed.first_day(),
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_iso_order() {
        assert_eq!(
            MonthYear::parse("2025-07"),
            Err(MonthYearError::MonthOutOfRange)
        );
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        assert_eq!(MonthYear::parse("072025"), Err(MonthYearError::InvalidFormat));
        assert_eq!(MonthYear::parse("07-20-25"), Err(MonthYearError::InvalidFormat));
        assert_eq!(MonthYear::parse(""), Err(MonthYearError::InvalidFormat));
    }

    #[test]
    fn test_parse_rejects_month_out_of_range() {
        assert_eq!(MonthYear::parse("13-2025"), Err(MonthYearError::MonthOutOfRange));
        assert_eq!(MonthYear::parse("00-2025"), Err(MonthYearError::MonthOutOfRange));
    }

    #[test]
    fn test_parse_rejects_non_numeric_parts() {
        assert_eq!(MonthYear::parse("aa-2025"), Err(MonthYearError::InvalidMonth));
        assert_eq!(MonthYear::parse("07-aa"), Err(MonthYearError::InvalidYear));
    }

    #[test]
    fn test_parse_rejects_year_out_of_range() {
        assert_eq!(MonthYear::parse("01-1900"), Err(MonthYearError::YearOutOfRange));
        assert_eq!(MonthYear::parse("01-2500"), Err(MonthYearError::YearOutOfRange));
        assert!(MonthYear::parse("01-1901").is_ok());
        assert!(MonthYear::parse("12-2499").is_ok());
    }

    #[test]
    fn test_display_pads_month_and_year() {
        assert_eq!(month(2025, 7).to_string(), "07-2025");
        assert_eq!(MonthYear::parse("3-2025").unwrap().to_string(), "03-2025");
    }

    #[test]
    fn test_from_date_discards_day() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        assert_eq!(MonthYear::from(date), month(2025, 3));
    }

    #[test]
    fn test_ordering_is_year_then_month() {
        assert!(month(2024, 12) < month(2025, 1));
        assert!(month(2025, 2) > month(2025, 1));
    }

    #[test]
    fn test_months_inclusive() {
        assert_eq!(months_inclusive(month(2025, 7), month(2025, 7)), 1);
        assert_eq!(months_inclusive(month(2025, 1), month(2025, 3)), 3);
        assert_eq!(months_inclusive(month(2024, 11), month(2025, 2)), 4);
    }

    #[test]
    fn test_serde_uses_month_year_string() {
        let json = serde_json::to_string(&month(2025, 7)).unwrap();
        assert_eq!(json, "\"07-2025\"");

        let back: MonthYear = serde_json::from_str("\"11-2024\"").unwrap();
        assert_eq!(back, month(2024, 11));
        assert!(serde_json::from_str::<MonthYear>("\"2024-11\"").is_err());
    }
}

//! Date parsing, formatting and range validation.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::ValidationError;

/// Date layout expected by the ISS API.
const ISS_DATE_FORMAT: &str = "%Y-%m-%d";

/// Naive ISO 8601 date-time layouts, tried in order.
const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Regional date layouts accepted after ISO parsing fails.
const REGIONAL_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%m/%d/%Y", "%Y/%m/%d"];

/// A date supplied by a caller, either already typed or still textual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateInput {
    /// Unparsed text in one of the accepted layouts.
    Text(String),
    /// A calendar date.
    Date(NaiveDate),
    /// A date-time; only the date part is used.
    DateTime(NaiveDateTime),
}

impl DateInput {
    /// Resolves the input to a calendar date.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDate`] if text matches no accepted layout.
    pub fn to_date(&self) -> Result<NaiveDate, ValidationError> {
        match self {
            Self::Text(s) => parse_date(s),
            Self::Date(d) => Ok(*d),
            Self::DateTime(dt) => Ok(dt.date()),
        }
    }
}

impl From<&str> for DateInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DateInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for DateInput {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<NaiveDate> for DateInput {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DateInput {
    fn from(value: DateTime<Tz>) -> Self {
        Self::DateTime(value.naive_local())
    }
}

/// Parses an ISO 8601 string or one of the regional layouts into a date.
///
/// Accepted layouts: ISO 8601 date or date-time (with or without offset),
/// `YYYY-MM-DD`, `DD.MM.YYYY`, `MM/DD/YYYY`, `YYYY/MM/DD`.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidDate`] if no layout matches.
pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = input.trim();

    if let Some(dt) = parse_iso(trimmed) {
        return Ok(dt.date());
    }

    REGIONAL_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| ValidationError::InvalidDate(input.to_string()))
}

/// Formats a date input as `YYYY-MM-DD`, the layout the ISS API expects.
///
/// # Example
///
/// ```
/// use moexiss_types::format_date;
///
/// assert_eq!(format_date("15.01.2024").unwrap(), "2024-01-15");
/// assert_eq!(format_date("2024-01-15").unwrap(), "2024-01-15");
/// ```
///
/// # Errors
///
/// Returns [`ValidationError::InvalidDate`] if text matches no accepted layout.
pub fn format_date(input: impl Into<DateInput>) -> Result<String, ValidationError> {
    Ok(input.into().to_date()?.format(ISS_DATE_FORMAT).to_string())
}

/// Parses an ISO date-time as returned by the API (`Z` suffix, offsets and
/// fractional seconds allowed). A bare date yields midnight.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidDate`] if the string is not ISO 8601.
pub fn parse_iso_datetime(input: &str) -> Result<NaiveDateTime, ValidationError> {
    parse_iso(input.trim()).ok_or_else(|| ValidationError::InvalidDate(input.to_string()))
}

fn parse_iso(input: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.naive_local());
    }
    if let Some(dt) = ISO_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
    {
        return Some(dt);
    }
    NaiveDate::parse_from_str(input, ISS_DATE_FORMAT)
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// A validated range of dates for `from`/`till` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// Start date (inclusive).
    pub start: NaiveDate,
    /// End date (inclusive).
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a new date range, validating that start <= end.
    ///
    /// # Errors
    ///
    /// Returns an error if start > end.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a date range for a single day.
    #[must_use]
    pub const fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Rejects the range if it spans more than `max_days` days.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::IntervalTooLong`] if the span exceeds the limit.
    pub fn with_max_days(self, max_days: i64) -> Result<Self, ValidationError> {
        let days = self.span_days();
        if days > max_days {
            return Err(ValidationError::IntervalTooLong {
                max_days,
                days,
                start: self.start,
                end: self.end,
            });
        }
        Ok(self)
    }

    /// Returns the number of days between start and end (0 for a single day).
    #[must_use]
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Returns true if the range contains the given date.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Returns the start date in ISS layout, for the `from` parameter.
    #[must_use]
    pub fn from_param(&self) -> String {
        self.start.format(ISS_DATE_FORMAT).to_string()
    }

    /// Returns the end date in ISS layout, for the `till` parameter.
    #[must_use]
    pub fn till_param(&self) -> String {
        self.end.format(ISS_DATE_FORMAT).to_string()
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Validates and normalizes an optional date range.
///
/// The end defaults to today. Without a start the range is the single end
/// day. When `max_interval_days` is set, longer spans are rejected.
///
/// # Errors
///
/// Returns a [`ValidationError`] if a date is unparsable, start is after
/// end, or the span exceeds `max_interval_days`.
pub fn validate_date_range(
    start: Option<DateInput>,
    end: Option<DateInput>,
    max_interval_days: Option<i64>,
) -> Result<DateRange, ValidationError> {
    let end = match end {
        Some(end) => end.to_date()?,
        None => chrono::Local::now().date_naive(),
    };

    let Some(start) = start else {
        return Ok(DateRange::single_day(end));
    };

    let range = DateRange::new(start.to_date()?, end)?;
    match max_interval_days {
        Some(max_days) => range.with_max_days(max_days),
        None => Ok(range),
    }
}

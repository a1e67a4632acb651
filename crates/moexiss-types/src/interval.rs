//! Candle interval names and their ISS codes.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ValidationError;

/// Candle aggregation interval as understood by the ISS `candles` resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CandleInterval {
    /// 1-minute candles.
    #[serde(rename = "1min", alias = "min")]
    Minute1,
    /// 10-minute candles.
    #[serde(rename = "10min")]
    Minute10,
    /// 1-hour candles.
    Hour,
    /// Daily candles.
    #[default]
    Day,
    /// Weekly candles.
    Week,
    /// Monthly candles.
    Month,
    /// Quarterly candles.
    Quarter,
}

impl CandleInterval {
    /// Every accepted interval name, in documentation order.
    pub const NAMES: &'static [&'static str] = &[
        "min", "1min", "10min", "hour", "day", "week", "month", "quarter",
    ];

    /// Returns the numeric `interval` code sent to the API.
    #[must_use]
    pub const fn code(&self) -> u8 {
        match self {
            Self::Minute1 => 1,
            Self::Minute10 => 10,
            Self::Hour => 60,
            Self::Day => 24,
            Self::Week => 7,
            Self::Month => 31,
            Self::Quarter => 4,
        }
    }

    /// Looks up an interval by its numeric API code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Minute1),
            10 => Some(Self::Minute10),
            60 => Some(Self::Hour),
            24 => Some(Self::Day),
            7 => Some(Self::Week),
            31 => Some(Self::Month),
            4 => Some(Self::Quarter),
            _ => None,
        }
    }

    /// Returns the canonical interval name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minute1 => "1min",
            Self::Minute10 => "10min",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
        }
    }

    /// Returns all intervals.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Minute1,
            Self::Minute10,
            Self::Hour,
            Self::Day,
            Self::Week,
            Self::Month,
            Self::Quarter,
        ]
    }
}

impl std::fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CandleInterval {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "min" | "1min" => Ok(Self::Minute1),
            "10min" => Ok(Self::Minute10),
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            _ => Err(ValidationError::UnknownInterval(s.to_string())),
        }
    }
}

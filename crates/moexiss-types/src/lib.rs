//! Core types for the moexiss MOEX ISS client.
//!
//! This crate provides the fundamental types shared by the other moexiss crates:
//!
//! - [`IssError`] - Root error type with one variant per failure kind
//! - [`ParseError`] / [`ValidationError`] - Response and caller-input failures
//! - [`DateRange`] / [`format_date`] - Date handling for `from`/`till` parameters
//! - [`CandleInterval`] - Human-readable candle interval names and ISS codes

#![doc(issue_tracker_base_url = "https://github.com/moexiss/moexiss/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod date;
mod error;
mod interval;

pub use date::{
    DateInput, DateRange, format_date, parse_date, parse_iso_datetime, validate_date_range,
};
pub use error::{ErrorKind, IssError, ParseError, RawResponse, Result, ValidationError};
pub use interval::CandleInterval;

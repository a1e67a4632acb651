//! Blocking HTTP client and endpoint functions for the MOEX ISS API.
//!
//! This crate provides the request side of the pipeline:
//!
//! - [`url::build_url`] - Endpoint template substitution
//! - [`RateLimiter`] - Minimum spacing between requests
//! - [`IssClient`] - Request execution, status mapping and decoding
//! - [`endpoints`] - Convenience functions built on the resource calls
//! - [`CachedCandles`] - Memoized candle requests

#![doc(issue_tracker_base_url = "https://github.com/moexiss/moexiss/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cache;
mod client;
pub mod endpoints;
mod rate_limit;
mod resources;
pub mod url;

pub use cache::CachedCandles;
pub use client::{ClientConfig, DEFAULT_RETRY_AFTER, IssClient, Method, Request, check_status};
pub use rate_limit::RateLimiter;
pub use resources::{BoardPath, CandleQuery, CandleSource, HistoryQuery, SecurityScope};

//! Blocking Rust client for the MOEX ISS REST API.
//!
//! This is a facade crate that re-exports functionality from the moexiss
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```no_run
//! use moexiss_lib::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let client = IssClient::with_defaults()?;
//!
//!     let query = CandleQuery::new("SBER", "stock", "shares")
//!         .with_interval(CandleInterval::Day)
//!         .with_dates(Some("2024-01-01".into()), Some("2024-01-31".into()));
//!     let candles = client.candles(&query)?;
//!     println!("Downloaded {} candles", candles.len());
//!
//!     Ok(())
//! }
//! ```

#![doc(issue_tracker_base_url = "https://github.com/moexiss/moexiss/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use moexiss_types::*;

// Re-export the table pipeline
pub use moexiss_table::{
    Blocks, Column, ColumnKind, NormalizationSpec, Row, RowRef, Table, TableSource, Tables,
    Value, infer_types, normalize, parse_blocks, parse_body, to_tables,
};

// Re-export fetch functionality
#[cfg(feature = "fetch")]
pub use moexiss_fetch::{
    BoardPath, CachedCandles, CandleQuery, CandleSource, ClientConfig, DEFAULT_RETRY_AFTER,
    HistoryQuery, IssClient, Method, RateLimiter, Request, SecurityScope, check_status,
    endpoints, url,
};

// Re-export formatters
#[cfg(feature = "format")]
pub use moexiss_format::{
    CsvFormatter, FormatError, Formatter, JsonFormatter, JsonStyle, OutputFormat,
};

#[cfg(feature = "parquet")]
pub use moexiss_format::ParquetFormatter;

/// Prelude module for convenient imports.
///
/// ```
/// use moexiss_lib::prelude::*;
/// ```
pub mod prelude {
    pub use moexiss_types::{
        CandleInterval, DateInput, DateRange, IssError, ParseError, Result, ValidationError,
    };

    pub use moexiss_table::{NormalizationSpec, Row, Table, Tables, Value};

    #[cfg(feature = "fetch")]
    pub use moexiss_fetch::{
        BoardPath, CachedCandles, CandleQuery, ClientConfig, HistoryQuery, IssClient,
        SecurityScope,
    };

    #[cfg(feature = "format")]
    pub use moexiss_format::{CsvFormatter, Formatter, JsonFormatter, OutputFormat};

    #[cfg(feature = "parquet")]
    pub use moexiss_format::ParquetFormatter;
}

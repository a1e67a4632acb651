//! ISS response parsing and table normalization.
//!
//! This crate turns the ISS columnar JSON format into typed tables:
//!
//! - [`parse_blocks`] / [`parse_body`] - Block extraction into [`Row`]s
//! - [`to_tables`] - Rows or blocks into [`Table`]s
//! - [`normalize`] - Date, numeric and categorical coercion plus indexing
//! - [`infer_types`] - Automatic column type detection
//!
//! # Example
//!
//! ```
//! use moexiss_table::{NormalizationSpec, parse_body, to_tables};
//!
//! let body = r#"{"candles": {"columns": ["begin", "close"],
//!                "data": [["2024-01-15 00:00:00", "271.5"]]}}"#;
//! let blocks = parse_body(body).unwrap();
//! let table = to_tables(blocks, Some("candles")).unwrap().into_single().unwrap();
//!
//! let spec = NormalizationSpec::new()
//!     .with_dates(["begin"])
//!     .with_numeric(["close"])
//!     .with_index("begin");
//! let normalized = table.normalize(&spec);
//! assert_eq!(normalized.width(), 1);
//! assert_eq!(normalized.get(0, "close").and_then(|v| v.as_f64()), Some(271.5));
//! ```

#![doc(issue_tracker_base_url = "https://github.com/moexiss/moexiss/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod convert;
mod infer;
mod normalize;
mod parse;
mod row;
mod table;
mod value;

pub use convert::{TableSource, Tables, to_tables};
pub use infer::infer_types;
pub use normalize::{NormalizationSpec, normalize};
pub use parse::{Blocks, parse_blocks, parse_body};
pub use row::Row;
pub use table::{Column, ColumnKind, RowRef, Table};
pub use value::Value;

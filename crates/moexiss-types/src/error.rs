//! Error types for moexiss.

use std::borrow::Cow;
use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;

use crate::CandleInterval;

/// Result type alias for moexiss operations.
pub type Result<T> = std::result::Result<T, IssError>;

/// Discriminant of an [`IssError`], useful for matching without payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request never reached the server.
    Connection,
    /// The server answered 401 or 403.
    Auth,
    /// The server answered 429.
    RateLimit,
    /// The server answered with any other status >= 400.
    Response,
    /// The body was not JSON or violated the block schema.
    Parse,
    /// Caller input was rejected before a request was made.
    Validation,
}

/// The part of an HTTP response kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// Final request URL.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body as text (possibly empty).
    pub body: String,
}

/// Errors that can occur while talking to the ISS API.
#[derive(Error, Debug)]
pub enum IssError {
    /// Transport failure; the request did not complete.
    #[error("{message}: {source}")]
    Connection {
        /// Human-readable summary.
        message: String,
        /// Underlying transport error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Authentication or authorization failure (401/403).
    #[error("{message} (Status code: {status})")]
    Auth {
        /// Human-readable summary.
        message: String,
        /// HTTP status code.
        status: u16,
        /// The offending response.
        response: RawResponse,
    },

    /// The server asked the client to slow down (429).
    #[error("{message} (Retry after: {} seconds)", .retry_after.as_secs())]
    RateLimit {
        /// Human-readable summary.
        message: String,
        /// HTTP status code.
        status: u16,
        /// How long the server asked to wait.
        retry_after: Duration,
        /// The offending response.
        response: RawResponse,
    },

    /// Any other error status (>= 400).
    #[error("{message} (Status code: {status})")]
    Response {
        /// Human-readable summary.
        message: String,
        /// HTTP status code.
        status: u16,
        /// The offending response.
        response: RawResponse,
    },

    /// Malformed or schema-violating response body.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Rejected caller input.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl IssError {
    /// Wraps a transport error.
    pub fn connection(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Connection {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::RateLimit { .. } => ErrorKind::RateLimit,
            Self::Response { .. } => ErrorKind::Response,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Validation(_) => ErrorKind::Validation,
        }
    }

    /// Returns the human-readable message without status decorations.
    #[must_use]
    pub fn message(&self) -> Cow<'_, str> {
        match self {
            Self::Connection { message, .. }
            | Self::Auth { message, .. }
            | Self::RateLimit { message, .. }
            | Self::Response { message, .. } => Cow::Borrowed(message),
            Self::Parse(e) => Cow::Owned(e.to_string()),
            Self::Validation(e) => Cow::Owned(e.to_string()),
        }
    }

    /// Returns the HTTP status code, if the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. }
            | Self::RateLimit { status, .. }
            | Self::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the server-requested back-off for rate limit errors.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimit { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// Returns the raw response, if the server answered.
    #[must_use]
    pub const fn response(&self) -> Option<&RawResponse> {
        match self {
            Self::Auth { response, .. }
            | Self::RateLimit { response, .. }
            | Self::Response { response, .. } => Some(response),
            _ => None,
        }
    }
}

/// Errors raised while decoding a response into rows and tables.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The body is not valid JSON.
    #[error("Failed to parse JSON response: {source}")]
    InvalidJson {
        /// Decoder error.
        source: serde_json::Error,
        /// The body that failed to decode.
        body: String,
    },

    /// The document is not an object of named blocks.
    #[error("Failed to parse API response: expected an object of blocks, found {found}")]
    NotAMapping {
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// A row does not have one value per column.
    #[error(
        "Column count mismatch in block '{block}': {columns} columns defined but row {row} has {values} values"
    )]
    ColumnCountMismatch {
        /// Block name.
        block: String,
        /// Zero-based row position.
        row: usize,
        /// Number of declared columns.
        columns: usize,
        /// Number of values in the row.
        values: usize,
    },

    /// A requested block is absent.
    #[error("Block '{0}' not found in response")]
    BlockNotFound(String),

    /// Rows handed to the table converter do not share one schema.
    #[error("Failed to convert rows to a table: row {row} has columns {found:?}, expected {expected:?}")]
    SchemaMismatch {
        /// Zero-based row position.
        row: usize,
        /// Schema taken from the first row.
        expected: Vec<String>,
        /// Schema of the offending row.
        found: Vec<String>,
    },

    /// A column required by an operation is absent.
    #[error("Column '{0}' not found in table")]
    MissingColumn(String),
}

/// Errors for caller input rejected before any request is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A date string matched none of the accepted formats.
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// Start date is after end date.
    #[error("Start date ({start}) is after end date ({end})")]
    InvalidRange {
        /// The start date.
        start: NaiveDate,
        /// The end date.
        end: NaiveDate,
    },

    /// The range spans more days than the caller allows.
    #[error(
        "Date range exceeds maximum interval of {max_days} days. Requested: {days} days ({start} to {end})"
    )]
    IntervalTooLong {
        /// Caller-supplied limit.
        max_days: i64,
        /// Requested span in days.
        days: i64,
        /// The start date.
        start: NaiveDate,
        /// The end date.
        end: NaiveDate,
    },

    /// Unknown candle interval name.
    #[error("Invalid interval: '{0}'. Valid intervals are: {valid}", valid = CandleInterval::NAMES.join(", "))]
    UnknownInterval(String),

    /// An endpoint template still contains a `[name]` placeholder.
    #[error("No value supplied for path placeholder '[{placeholder}]' in {endpoint}")]
    UnresolvedPlaceholder {
        /// Placeholder name without brackets.
        placeholder: String,
        /// The endpoint template.
        endpoint: String,
    },

    /// A configuration value could not be interpreted.
    #[error("Invalid value for {key}: {value}")]
    InvalidConfig {
        /// Setting name.
        key: String,
        /// Rejected value.
        value: String,
    },
}

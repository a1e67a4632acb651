//! Output format abstraction.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use moexiss_table::Table;
use thiserror::Error;

use crate::{CsvFormatter, JsonFormatter};

/// Output format identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// CSV format.
    #[default]
    Csv,
    /// JSON array format.
    Json,
    /// Newline-delimited JSON format.
    Ndjson,
    /// Apache Parquet format.
    Parquet,
}

impl OutputFormat {
    /// Returns the file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Ndjson => "ndjson",
            Self::Parquet => "parquet",
        }
    }

    /// Returns all available formats.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Csv, Self::Json, Self::Ndjson, Self::Parquet]
    }

    /// Guesses the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    /// Writes a table in this format.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails, or [`FormatError::Unsupported`]
    /// for Parquet when the `parquet` feature is disabled.
    pub fn write_table<W: Write + Send>(&self, table: &Table, writer: W) -> Result<(), FormatError> {
        match self {
            Self::Csv => CsvFormatter::new().write_table(table, writer),
            Self::Json => JsonFormatter::new().write_table(table, writer),
            Self::Ndjson => JsonFormatter::ndjson().write_table(table, writer),
            #[cfg(feature = "parquet")]
            Self::Parquet => crate::ParquetFormatter::new().write_table(table, writer),
            #[cfg(not(feature = "parquet"))]
            Self::Parquet => Err(FormatError::Unsupported(*self)),
        }
    }

    /// Creates (or truncates) a file and writes a table into it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    pub fn write_file(&self, table: &Table, path: &Path) -> Result<(), FormatError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_table(table, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            "parquet" | "pq" => Ok(Self::Parquet),
            _ => Err(FormatError::UnknownFormat(s.to_string())),
        }
    }
}

/// Errors that can occur during formatting.
#[derive(Error, Debug)]
pub enum FormatError {
    /// Unknown output format.
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    /// Format not compiled in.
    #[error("Format {0} is not supported by this build")]
    Unsupported(OutputFormat),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Arrow/Parquet error.
    #[error("Parquet error: {0}")]
    Parquet(String),
}

/// Trait for table writers.
pub trait Formatter: Send + Sync {
    /// Writes a table, index column first.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write + Send>(&self, table: &Table, writer: W) -> Result<(), FormatError>;

    /// Returns the file extension for this format.
    fn extension(&self) -> &str;
}

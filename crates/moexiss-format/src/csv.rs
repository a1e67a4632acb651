//! CSV output format.

use std::io::Write;

use moexiss_table::Table;

use crate::{FormatError, Formatter};

/// CSV formatter.
#[derive(Debug, Clone)]
pub struct CsvFormatter {
    /// Field delimiter (default: comma).
    delimiter: u8,
    /// Whether to include header row.
    include_header: bool,
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvFormatter {
    /// Creates a new CSV formatter with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            delimiter: b',',
            include_header: true,
        }
    }

    /// Sets the field delimiter.
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets whether to include a header row.
    #[must_use]
    pub const fn with_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }

    /// Creates a tab-separated values (TSV) formatter.
    #[must_use]
    pub const fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            include_header: true,
        }
    }
}

impl Formatter for CsvFormatter {
    fn write_table<W: Write + Send>(&self, table: &Table, writer: W) -> Result<(), FormatError> {
        let mut out = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_writer(writer);

        let columns: Vec<_> = table.all_columns().collect();

        if self.include_header && !columns.is_empty() {
            out.write_record(columns.iter().map(|c| c.name()))?;
        }

        for position in 0..table.len() {
            out.write_record(
                columns
                    .iter()
                    .map(|c| c.get(position).map(ToString::to_string).unwrap_or_default()),
            )?;
        }

        out.flush()?;
        Ok(())
    }

    fn extension(&self) -> &str {
        "csv"
    }
}

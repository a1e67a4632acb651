//! Apache Parquet output format.

use std::io::Write;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, DictionaryArray, Float64Array, Int64Array, StringArray,
    TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Int32Type, Schema, TimeUnit};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use moexiss_table::{Column, ColumnKind, Table, Value};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::{FormatError, Formatter};

/// Physical encoding chosen for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Int,
    Float,
    Bool,
    Timestamp,
    Text,
    Category,
}

impl Encoding {
    fn of(column: &Column) -> Self {
        let all = |f: fn(&Value) -> bool| column.values().iter().filter(|v| !v.is_null()).all(f);

        match column.kind() {
            ColumnKind::DateTime => Self::Timestamp,
            ColumnKind::Categorical => Self::Category,
            ColumnKind::Boolean => Self::Bool,
            ColumnKind::Numeric if column.values().iter().all(Value::is_null) => Self::Float,
            ColumnKind::Raw if column.values().iter().all(Value::is_null) => Self::Text,
            _ if all(|v| matches!(v, Value::Integer(_))) => Self::Int,
            _ if all(|v| v.as_f64().is_some()) => Self::Float,
            ColumnKind::Raw if all(|v| matches!(v, Value::Bool(_))) => Self::Bool,
            ColumnKind::Raw if all(|v| matches!(v, Value::DateTime(_))) => Self::Timestamp,
            _ => Self::Text,
        }
    }

    fn data_type(self) -> DataType {
        match self {
            Self::Int => DataType::Int64,
            Self::Float => DataType::Float64,
            Self::Bool => DataType::Boolean,
            Self::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
            Self::Text => DataType::Utf8,
            Self::Category => DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8)),
        }
    }
}

/// Parquet formatter.
#[derive(Debug, Clone)]
pub struct ParquetFormatter {
    /// Row group size (number of rows per group).
    row_group_size: usize,
    /// Compression codec.
    compression: Compression,
}

impl Default for ParquetFormatter {
    fn default() -> Self {
        Self {
            row_group_size: 100_000,
            compression: Compression::SNAPPY,
        }
    }
}

impl ParquetFormatter {
    /// Creates a new Parquet formatter with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the row group size.
    #[must_use]
    pub const fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Sets the compression codec.
    #[must_use]
    pub const fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Creates the Arrow schema for a table, index column first.
    fn schema(table: &Table) -> Schema {
        Schema::new(
            table
                .all_columns()
                .map(|c| Field::new(c.name(), Encoding::of(c).data_type(), true))
                .collect::<Vec<_>>(),
        )
    }

    fn column_array(column: &Column) -> ArrayRef {
        let values = column.values();
        match Encoding::of(column) {
            Encoding::Int => Arc::new(Int64Array::from(
                values.iter().map(Value::as_i64).collect::<Vec<_>>(),
            )),
            Encoding::Float => Arc::new(Float64Array::from(
                values.iter().map(Value::as_f64).collect::<Vec<_>>(),
            )),
            Encoding::Bool => Arc::new(BooleanArray::from(
                values.iter().map(Value::as_bool).collect::<Vec<_>>(),
            )),
            Encoding::Timestamp => Arc::new(TimestampMicrosecondArray::from(
                values
                    .iter()
                    .map(|v| v.as_datetime().map(|dt| dt.and_utc().timestamp_micros()))
                    .collect::<Vec<_>>(),
            )),
            Encoding::Text => Arc::new(StringArray::from(text_values(values))),
            Encoding::Category => {
                let texts = text_values(values);
                let array: DictionaryArray<Int32Type> = texts.iter().map(Option::as_deref).collect();
                Arc::new(array)
            }
        }
    }

    /// Converts a table to an Arrow `RecordBatch`.
    fn table_to_batch(table: &Table) -> Result<RecordBatch, FormatError> {
        RecordBatch::try_new_with_options(
            Arc::new(Self::schema(table)),
            table.all_columns().map(Self::column_array).collect(),
            &RecordBatchOptions::new().with_row_count(Some(table.len())),
        )
        .map_err(|e| FormatError::Parquet(e.to_string()))
    }
}

fn text_values(values: &[Value]) -> Vec<Option<String>> {
    values
        .iter()
        .map(|v| (!v.is_null()).then(|| v.to_string()))
        .collect()
}

impl Formatter for ParquetFormatter {
    fn write_table<W: Write + Send>(&self, table: &Table, writer: W) -> Result<(), FormatError> {
        let batch = Self::table_to_batch(table)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut arrow_writer = ArrowWriter::try_new(writer, batch.schema(), Some(props))
            .map_err(|e| FormatError::Parquet(e.to_string()))?;
        arrow_writer
            .write(&batch)
            .map_err(|e| FormatError::Parquet(e.to_string()))?;
        arrow_writer
            .close()
            .map_err(|e| FormatError::Parquet(e.to_string()))?;

        Ok(())
    }

    fn extension(&self) -> &str {
        "parquet"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moexiss_table::{NormalizationSpec, Row};
    use std::io::Cursor;

    fn candles() -> Table {
        let rows: Vec<Row> = [("2024-01-15 10:00:00", 271.5, 120, "TQBR"), ("2024-01-15 11:00:00", 272.0, 80, "TQBR")]
            .into_iter()
            .map(|(begin, close, volume, board)| {
                [
                    ("begin", Value::from(begin)),
                    ("close", Value::Float(close)),
                    ("volume", Value::Integer(volume)),
                    ("BOARDID", Value::from(board)),
                    ("flag", Value::Bool(true)),
                ]
                .into_iter()
                .collect()
            })
            .collect();
        Table::from_rows(rows).unwrap().normalize(
            &NormalizationSpec::new()
                .with_dates(["begin"])
                .with_categorical(["BOARDID"])
                .with_index("begin"),
        )
    }

    #[test]
    fn test_parquet_table() {
        let formatter = ParquetFormatter::new();
        let mut output = Cursor::new(Vec::new());

        formatter.write_table(&candles(), &mut output).unwrap();

        // Parquet files start with "PAR1" magic bytes
        let data = output.into_inner();
        assert!(data.len() > 4);
        assert_eq!(&data[0..4], b"PAR1");
    }

    #[test]
    fn test_schema_types() {
        let schema = ParquetFormatter::schema(&candles());
        let types: Vec<_> = schema.fields().iter().map(|f| f.data_type().clone()).collect();
        assert_eq!(
            types,
            [
                DataType::Timestamp(TimeUnit::Microsecond, None),
                DataType::Float64,
                DataType::Int64,
                DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8)),
                DataType::Boolean,
            ]
        );
        assert_eq!(schema.field(0).name(), "begin");
    }

    #[test]
    fn test_empty_table() {
        let table = Table::empty_with_columns(["TICKER", "LAST"]);
        let batch = ParquetFormatter::table_to_batch(&table).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 2);

        let mut output = Cursor::new(Vec::new());
        ParquetFormatter::new()
            .write_table(&Table::default(), &mut output)
            .unwrap();
        assert_eq!(&output.into_inner()[0..4], b"PAR1");
    }
}

//! Column coercion and index designation.

use chrono::NaiveTime;
use log::debug;
use moexiss_types::{parse_date, parse_iso_datetime};

use crate::{ColumnKind, Table, Value};

/// Which columns to coerce and which one to index by.
///
/// Names that are not present in a table are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationSpec {
    /// Columns coerced to date-times; unparsable values become null.
    pub dates: Vec<String>,
    /// Columns coerced to numbers; unparsable values become null.
    pub numeric: Vec<String>,
    /// Columns marked categorical. Values are unchanged.
    pub categorical: Vec<String>,
    /// Column moved into the index slot after all coercions.
    pub index: Option<String>,
}

impl NormalizationSpec {
    /// Creates an empty spec, which leaves tables unchanged.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            dates: Vec::new(),
            numeric: Vec::new(),
            categorical: Vec::new(),
            index: None,
        }
    }

    /// Adds date columns.
    #[must_use]
    pub fn with_dates<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dates.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Adds numeric columns.
    #[must_use]
    pub fn with_numeric<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Adds categorical columns.
    #[must_use]
    pub fn with_categorical<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Sets the index column.
    #[must_use]
    pub fn with_index(mut self, column: impl Into<String>) -> Self {
        self.index = Some(column.into());
        self
    }

    /// Returns true if the spec changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
            && self.numeric.is_empty()
            && self.categorical.is_empty()
            && self.index.is_none()
    }
}

impl Table {
    /// Returns a normalized copy of this table. See [`normalize`].
    #[must_use]
    pub fn normalize(&self, spec: &NormalizationSpec) -> Self {
        normalize(self, spec)
    }
}

/// Returns a copy of `table` with the coercions in `spec` applied.
///
/// Date, numeric and categorical coercions are applied in that order, then
/// the index is designated. The input is never modified. Coercing an
/// already-coerced column gives the same result.
#[must_use]
pub fn normalize(table: &Table, spec: &NormalizationSpec) -> Table {
    let mut out = table.clone();

    for name in &spec.dates {
        if let Some(column) = out.column_mut(name) {
            column.values_mut().iter_mut().for_each(|v| *v = to_datetime(v));
            column.set_kind(ColumnKind::DateTime);
        }
    }

    for name in &spec.numeric {
        if let Some(column) = out.column_mut(name) {
            column.values_mut().iter_mut().for_each(|v| *v = to_number(v));
            column.set_kind(ColumnKind::Numeric);
        }
    }

    for name in &spec.categorical {
        if let Some(column) = out.column_mut(name) {
            column.set_kind(ColumnKind::Categorical);
        }
    }

    if let Some(index) = &spec.index {
        if !out.set_index(index) && out.index().is_none_or(|c| c.name() != index) {
            debug!("Index column '{index}' not present, leaving table unindexed");
        }
    }

    out
}

pub(crate) fn to_datetime(value: &Value) -> Value {
    match value {
        Value::DateTime(dt) => Value::DateTime(*dt),
        Value::Text(text) => parse_iso_datetime(text)
            .or_else(|_| parse_date(text).map(|d| d.and_time(NaiveTime::MIN)))
            .map_or(Value::Null, Value::DateTime),
        _ => Value::Null,
    }
}

pub(crate) fn to_number(value: &Value) -> Value {
    match value {
        Value::Integer(_) | Value::Float(_) => value.clone(),
        Value::Bool(b) => Value::Integer(i64::from(*b)),
        Value::Text(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .map(Value::Integer)
                .or_else(|_| text.parse::<f64>().map(Value::Float))
                .unwrap_or(Value::Null)
        }
        Value::Null | Value::DateTime(_) => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Row;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn candles() -> Table {
        let rows: Vec<Row> = [
            ("2024-01-15 10:00:00", "271.5", "TQBR"),
            ("2024-01-15 11:00:00", "n/a", "TQBR"),
            ("garbage", "272", "SMAL"),
        ]
        .into_iter()
        .map(|(begin, close, board)| {
            [
                ("begin", Value::from(begin)),
                ("close", Value::from(close)),
                ("BOARDID", Value::from(board)),
            ]
            .into_iter()
            .collect()
        })
        .collect();
        Table::from_rows(rows).unwrap()
    }

    #[test]
    fn test_empty_spec_is_identity() {
        let table = candles();
        assert_eq!(normalize(&table, &NormalizationSpec::new()), table);
        assert!(NormalizationSpec::default().is_empty());
    }

    #[test]
    fn test_date_coercion() {
        let table = candles().normalize(&NormalizationSpec::new().with_dates(["begin"]));
        let begin = table.column("begin").unwrap();
        assert_eq!(begin.kind(), ColumnKind::DateTime);
        assert_eq!(
            begin.get(0).and_then(Value::as_datetime),
            NaiveDate::from_ymd_opt(2024, 1, 15).and_then(|d| d.and_hms_opt(10, 0, 0))
        );
        assert_eq!(begin.get(2), Some(&Value::Null));
    }

    #[test]
    fn test_date_coercion_idempotent() {
        let spec = NormalizationSpec::new().with_dates(["begin"]);
        let once = candles().normalize(&spec);
        assert_eq!(once.normalize(&spec), once);
    }

    #[test]
    fn test_numeric_coercion() {
        let table = candles().normalize(&NormalizationSpec::new().with_numeric(["close"]));
        let close = table.column("close").unwrap();
        assert_eq!(close.kind(), ColumnKind::Numeric);
        assert_relative_eq!(close.get(0).and_then(Value::as_f64).unwrap(), 271.5);
        assert_eq!(close.get(1), Some(&Value::Null));
        assert_eq!(close.get(2), Some(&Value::Integer(272)));
    }

    #[test]
    fn test_categorical_keeps_values() {
        let table = candles();
        let normalized = table.normalize(&NormalizationSpec::new().with_categorical(["BOARDID"]));
        let boards = normalized.column("BOARDID").unwrap();
        assert_eq!(boards.kind(), ColumnKind::Categorical);
        assert_eq!(boards.values(), table.column("BOARDID").unwrap().values());
        assert_eq!(boards.categories().len(), 2);
    }

    #[test]
    fn test_index_applied_after_coercion() {
        let spec = NormalizationSpec::new()
            .with_dates(["begin"])
            .with_numeric(["close"])
            .with_index("begin");
        let table = candles().normalize(&spec);
        let index = table.index().unwrap();
        assert_eq!(index.name(), "begin");
        assert_eq!(index.kind(), ColumnKind::DateTime);
        assert_eq!(table.column_names().collect::<Vec<_>>(), ["close", "BOARDID"]);
    }

    #[test]
    fn test_missing_columns_ignored() {
        let table = candles();
        let spec = NormalizationSpec::new()
            .with_dates(["nope"])
            .with_numeric(["nope"])
            .with_categorical(["nope"])
            .with_index("nope");
        assert_eq!(table.normalize(&spec), table);
    }

    #[test]
    fn test_input_not_modified() {
        let table = candles();
        let before = table.clone();
        let _ = table.normalize(&NormalizationSpec::new().with_numeric(["close"]).with_index("begin"));
        assert_eq!(table, before);
    }

    #[test]
    fn test_to_number_variants() {
        assert_eq!(to_number(&Value::Bool(true)), Value::Integer(1));
        assert_eq!(to_number(&Value::from(" 12 ")), Value::Integer(12));
        assert_eq!(to_number(&Value::from("")), Value::Null);
        assert_eq!(to_number(&Value::Null), Value::Null);
    }

    #[test]
    fn test_to_datetime_regional_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).map(|d| d.and_time(NaiveTime::MIN));
        assert_eq!(to_datetime(&Value::from("15.01.2024")).as_datetime(), expected);
        assert_eq!(to_datetime(&Value::Integer(5)), Value::Null);
    }
}

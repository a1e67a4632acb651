//! Automatic column type detection.

use crate::normalize::{to_datetime, to_number};
use crate::{ColumnKind, Table, Value};

/// Returns a copy of `table` with textual columns converted by content.
///
/// Only raw columns whose non-null values are all text are considered.
/// Rules are tried in order and the first that matches every non-null
/// value wins:
///
/// 1. `YYYY-MM-DD` dates become [`ColumnKind::DateTime`]
/// 2. `"0"` / `"1"` flags become [`ColumnKind::Boolean`]
/// 3. Numbers become [`ColumnKind::Numeric`]
///
/// Other columns are left as they are.
#[must_use]
pub fn infer_types(table: &Table) -> Table {
    let mut out = table.clone();

    for column in out.columns_mut() {
        if column.kind() != ColumnKind::Raw {
            continue;
        }
        let texts: Option<Vec<&str>> = column
            .values()
            .iter()
            .filter(|v| !v.is_null())
            .map(Value::as_str)
            .collect();
        let Some(texts) = texts.filter(|t| !t.is_empty()) else {
            continue;
        };

        let kind = if texts.iter().all(|t| is_iso_date(t)) {
            ColumnKind::DateTime
        } else if texts.iter().all(|t| matches!(*t, "0" | "1")) {
            ColumnKind::Boolean
        } else if texts.iter().all(|t| !to_number(&Value::from(*t)).is_null()) {
            ColumnKind::Numeric
        } else {
            continue;
        };

        for value in column.values_mut() {
            *value = match kind {
                ColumnKind::DateTime => to_datetime(value),
                ColumnKind::Boolean => match value.as_str() {
                    Some(flag) => Value::Bool(flag == "1"),
                    None => Value::Null,
                },
                _ => to_number(value),
            };
        }
        column.set_kind(kind);
    }

    out
}

fn is_iso_date(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Row;

    fn table(columns: &[(&str, [Value; 2])]) -> Table {
        let rows: Vec<Row> = (0..2)
            .map(|i| {
                columns
                    .iter()
                    .map(|(name, values)| (*name, values[i].clone()))
                    .collect()
            })
            .collect();
        Table::from_rows(rows).unwrap()
    }

    #[test]
    fn test_infers_each_kind() {
        let inferred = infer_types(&table(&[
            ("TRADEDATE", ["2024-01-15".into(), Value::Null]),
            ("IS_TRADED", ["1".into(), "0".into()]),
            ("VALUE", ["12.5".into(), "7".into()]),
            ("SHORTNAME", ["Sber".into(), "12".into()]),
            ("LOTSIZE", [Value::Integer(10), Value::Integer(1)]),
        ]));

        let kinds: Vec<ColumnKind> = inferred.columns().iter().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            [
                ColumnKind::DateTime,
                ColumnKind::Boolean,
                ColumnKind::Numeric,
                ColumnKind::Raw,
                ColumnKind::Raw,
            ]
        );
        assert!(inferred.get(0, "TRADEDATE").unwrap().as_datetime().is_some());
        assert_eq!(inferred.get(1, "TRADEDATE"), Some(&Value::Null));
        assert_eq!(inferred.get(0, "IS_TRADED"), Some(&Value::Bool(true)));
        assert_eq!(inferred.get(1, "VALUE"), Some(&Value::Integer(7)));
    }

    #[test]
    fn test_all_null_column_untouched() {
        let source = table(&[("EMPTY", [Value::Null, Value::Null])]);
        assert_eq!(infer_types(&source), source);
    }

    #[test]
    fn test_iso_date_shape() {
        assert!(is_iso_date("2024-01-15"));
        assert!(!is_iso_date("2024-01-15 10:00:00"));
        assert!(!is_iso_date("15.01.2024"));
    }
}

//! Columnar tables.

use moexiss_types::ParseError;

use crate::{Row, Value};

/// Semantic kind attached to a column by normalization or inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColumnKind {
    /// Values as decoded from the wire.
    #[default]
    Raw,
    /// Every value is a [`Value::DateTime`] or null.
    DateTime,
    /// Every value is a [`Value::Integer`], [`Value::Float`] or null.
    Numeric,
    /// Values are treated as labels drawn from a finite set.
    Categorical,
    /// Every value is a [`Value::Bool`] or null.
    Boolean,
}

impl ColumnKind {
    /// Returns a short lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::DateTime => "datetime",
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
            Self::Boolean => "boolean",
        }
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named column of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    values: Vec<Value>,
}

impl Column {
    /// Creates a raw column.
    #[must_use]
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Raw,
            values,
        }
    }

    /// Sets the column kind.
    #[must_use]
    pub fn with_kind(mut self, kind: ColumnKind) -> Self {
        self.kind = kind;
        self
    }

    /// Returns the column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the column kind.
    #[must_use]
    pub const fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// Returns the values in row order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the value at a row position.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Value> {
        self.values.get(position)
    }

    /// Returns the number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the column has no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the distinct non-null values in first-seen order.
    #[must_use]
    pub fn categories(&self) -> Vec<&Value> {
        let mut seen: Vec<&Value> = Vec::new();
        for value in &self.values {
            if !value.is_null() && !seen.contains(&value) {
                seen.push(value);
            }
        }
        seen
    }

    pub(crate) fn set_kind(&mut self, kind: ColumnKind) {
        self.kind = kind;
    }

    pub(crate) fn values_mut(&mut self) -> &mut [Value] {
        &mut self.values
    }

    fn renamed(&self, name: String) -> Self {
        Self {
            name,
            kind: self.kind,
            values: self.values.clone(),
        }
    }

    fn take(&self, positions: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind,
            values: positions
                .iter()
                .map(|&p| self.values.get(p).cloned().unwrap_or_default())
                .collect(),
        }
    }
}

/// A two-dimensional table of named columns with an optional index column.
///
/// The index column, once designated, is kept apart from the general
/// columns: it is not part of [`Table::columns`] or [`Table::rows`] but is
/// still reachable by name through [`Table::column`] and is used by
/// [`Table::locate`] for primary lookups.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    index: Option<Column>,
    len: usize,
}

impl Table {
    /// Builds a table from rows that share one schema.
    ///
    /// The first row fixes the column order. Later rows may list the same
    /// columns in a different order. An empty input gives an empty table
    /// with no columns.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::SchemaMismatch`] if a row has a different set
    /// of columns than the first.
    pub fn from_rows(rows: Vec<Row>) -> Result<Self, ParseError> {
        let mut rows = rows.into_iter();
        let Some(first) = rows.next() else {
            return Ok(Self::default());
        };

        let schema: Vec<String> = first.keys().map(str::to_string).collect();
        let mut columns: Vec<Column> = first
            .into_fields()
            .into_iter()
            .map(|(name, value)| Column::new(name, vec![value]))
            .collect();

        for (offset, row) in rows.enumerate() {
            let position = offset + 1;
            let mismatch = || ParseError::SchemaMismatch {
                row: position,
                expected: schema.clone(),
                found: row.keys().map(str::to_string).collect(),
            };

            if row.len() != schema.len() {
                return Err(mismatch());
            }

            if row.keys().eq(schema.iter().map(String::as_str)) {
                for (column, (_, value)) in columns.iter_mut().zip(row.into_fields()) {
                    column.values.push(value);
                }
                continue;
            }

            if !schema.iter().all(|name| row.get(name).is_some()) {
                return Err(mismatch());
            }
            let mut fields = row.into_fields();
            for column in &mut columns {
                if let Some(at) = fields.iter().position(|(name, _)| *name == column.name) {
                    column.values.push(fields.swap_remove(at).1);
                }
            }
        }

        let len = columns.first().map_or(0, Column::len);
        Ok(Self {
            columns,
            index: None,
            len,
        })
    }

    /// Creates a table with the given columns and no rows.
    #[must_use]
    pub fn empty_with_columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: names
                .into_iter()
                .map(|name| Column::new(name, Vec::new()))
                .collect(),
            index: None,
            len: 0,
        }
    }

    /// Returns the number of rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of general (non-index) columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Returns the general columns in order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the general column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(Column::name)
    }

    /// Returns the index column, if one was designated.
    #[must_use]
    pub const fn index(&self) -> Option<&Column> {
        self.index.as_ref()
    }

    /// Returns the index column followed by the general columns.
    pub fn all_columns(&self) -> impl Iterator<Item = &Column> {
        self.index.iter().chain(self.columns.iter())
    }

    /// Looks up a column by name, including the index column.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.index.as_ref().filter(|c| c.name == name))
    }

    /// Returns true if a column (or the index) has this name.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Returns a single cell.
    #[must_use]
    pub fn get(&self, position: usize, column: &str) -> Option<&Value> {
        self.column(column).and_then(|c| c.get(position))
    }

    /// Returns a borrowed view of one row.
    #[must_use]
    pub fn row_ref(&self, position: usize) -> Option<RowRef<'_>> {
        (position < self.len).then_some(RowRef {
            table: self,
            position,
        })
    }

    /// Materializes one row of the general columns.
    #[must_use]
    pub fn row(&self, position: usize) -> Option<Row> {
        self.row_ref(position).map(|r| r.to_row())
    }

    /// Materializes every row of the general columns.
    pub fn rows(&self) -> impl Iterator<Item = Row> + '_ {
        (0..self.len).filter_map(|p| self.row(p))
    }

    /// Returns the positions whose index value equals `key`.
    ///
    /// Index values may repeat. A table without an index matches nothing.
    pub fn locate<'a>(&'a self, key: &'a Value) -> impl Iterator<Item = usize> + 'a {
        self.index
            .iter()
            .flat_map(|index| index.values.iter().enumerate())
            .filter(move |(_, value)| *value == key)
            .map(|(position, _)| position)
    }

    /// Moves the index column back in front of the general columns.
    #[must_use]
    pub fn reset_index(&self) -> Self {
        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        columns.extend(self.index.iter().cloned());
        columns.extend(self.columns.iter().cloned());
        Self {
            columns,
            index: None,
            len: self.len,
        }
    }

    /// Sets every row of `name` to `value`, appending the column if absent.
    #[must_use]
    pub fn with_constant_column(mut self, name: &str, value: impl Into<Value>) -> Self {
        let values = vec![value.into(); self.len];
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(column) => {
                column.values = values;
                column.kind = ColumnKind::Raw;
            }
            None => self.columns.push(Column::new(name, values)),
        }
        self
    }

    /// Removes a general column. Unknown names leave the table unchanged.
    #[must_use]
    pub fn drop_column(mut self, name: &str) -> Self {
        self.columns.retain(|c| c.name != name);
        self
    }

    /// Keeps the first `n` rows.
    #[must_use]
    pub fn head(&self, n: usize) -> Self {
        let positions: Vec<usize> = (0..self.len.min(n)).collect();
        self.take(&positions)
    }

    /// Keeps the rows for which `predicate` returns true.
    #[must_use]
    pub fn filter<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(RowRef<'_>) -> bool,
    {
        let positions: Vec<usize> = (0..self.len)
            .filter(|&position| {
                predicate(RowRef {
                    table: self,
                    position,
                })
            })
            .collect();
        self.take(&positions)
    }

    /// Stacks tables vertically.
    ///
    /// The result has the union of all column names in first-seen order.
    /// Missing cells are null and any index columns become general columns.
    #[must_use]
    pub fn concat<I>(tables: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let tables: Vec<Self> = tables.into_iter().map(|t| t.reset_index()).collect();

        let mut columns: Vec<Column> = Vec::new();
        for table in &tables {
            for column in &table.columns {
                if !columns.iter().any(|c| c.name == column.name) {
                    columns.push(Column::new(column.name.clone(), Vec::new()).with_kind(column.kind));
                }
            }
        }

        let len = tables.iter().map(Self::len).sum();
        for column in &mut columns {
            column.values.reserve(len);
            for table in &tables {
                match table.columns.iter().find(|c| c.name == column.name) {
                    Some(source) => column.values.extend(source.values.iter().cloned()),
                    None => column.values.extend(std::iter::repeat_n(Value::Null, table.len)),
                }
            }
        }

        Self {
            columns,
            index: None,
            len,
        }
    }

    /// Left-joins `right` on `self[left_on] == right[right_on]`.
    ///
    /// Every left row appears once per matching right row, or once with
    /// null right-hand cells when nothing matches. Null keys never match.
    /// Overlapping column names get `_x` and `_y` suffixes. When both key
    /// names are equal the key column appears once.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingColumn`] if either key column is absent.
    pub fn left_join(&self, right: &Self, left_on: &str, right_on: &str) -> Result<Self, ParseError> {
        let left = self.reset_index();
        let right = right.reset_index();

        let left_key = left
            .column(left_on)
            .ok_or_else(|| ParseError::MissingColumn(left_on.to_string()))?;
        let right_key = right
            .column(right_on)
            .ok_or_else(|| ParseError::MissingColumn(right_on.to_string()))?;

        let mut pairs: Vec<(usize, Option<usize>)> = Vec::with_capacity(left.len);
        for (l, key) in left_key.values.iter().enumerate() {
            let before = pairs.len();
            if !key.is_null() {
                pairs.extend(
                    right_key
                        .values
                        .iter()
                        .enumerate()
                        .filter(|(_, candidate)| *candidate == key)
                        .map(|(r, _)| (l, Some(r))),
                );
            }
            if pairs.len() == before {
                pairs.push((l, None));
            }
        }

        let shared_key = (left_on == right_on).then_some(left_on);
        let right_columns: Vec<&Column> = right
            .columns
            .iter()
            .filter(|c| Some(c.name.as_str()) != shared_key)
            .collect();
        let overlaps = |name: &str| {
            Some(name) != shared_key
                && left.columns.iter().any(|c| c.name == name)
                && right_columns.iter().any(|c| c.name == name)
        };

        let left_positions: Vec<usize> = pairs.iter().map(|(l, _)| *l).collect();
        let mut columns = Vec::with_capacity(left.columns.len() + right_columns.len());
        for column in &left.columns {
            let taken = column.take(&left_positions);
            columns.push(if overlaps(&column.name) {
                taken.renamed(format!("{}_x", column.name))
            } else {
                taken
            });
        }
        for column in right_columns.iter().copied() {
            let taken = Column {
                name: column.name.clone(),
                kind: column.kind,
                values: pairs
                    .iter()
                    .map(|(_, r)| r.and_then(|r| column.values.get(r).cloned()).unwrap_or_default())
                    .collect(),
            };
            columns.push(if overlaps(&column.name) {
                taken.renamed(format!("{}_y", column.name))
            } else {
                taken
            });
        }

        Ok(Self {
            columns,
            index: None,
            len: pairs.len(),
        })
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        if let Some(at) = self.columns.iter().position(|c| c.name == name) {
            return self.columns.get_mut(at);
        }
        self.index.as_mut().filter(|c| c.name == name)
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    /// Moves a general column into the index slot. A previous index returns
    /// to the front of the general columns.
    pub(crate) fn set_index(&mut self, name: &str) -> bool {
        let Some(at) = self.columns.iter().position(|c| c.name == name) else {
            return false;
        };
        let column = self.columns.remove(at);
        if let Some(previous) = self.index.replace(column) {
            self.columns.insert(0, previous);
        }
        true
    }

    fn take(&self, positions: &[usize]) -> Self {
        Self {
            columns: self.columns.iter().map(|c| c.take(positions)).collect(),
            index: self.index.as_ref().map(|c| c.take(positions)),
            len: positions.len(),
        }
    }
}

/// A borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    table: &'a Table,
    position: usize,
}

impl<'a> RowRef<'a> {
    /// Returns the row position.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Returns the value of a column (or the index) in this row.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.table.get(self.position, column)
    }

    /// Returns the index value of this row.
    #[must_use]
    pub fn index_value(&self) -> Option<&'a Value> {
        self.table.index.as_ref().and_then(|c| c.get(self.position))
    }

    /// Materializes the general columns of this row.
    #[must_use]
    pub fn to_row(&self) -> Row {
        self.table
            .columns
            .iter()
            .map(|c| {
                (
                    c.name.clone(),
                    c.values.get(self.position).cloned().unwrap_or_default(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[(&str, Value)]) -> Row {
        fields.iter().cloned().collect()
    }

    fn quotes() -> Table {
        Table::from_rows(vec![
            row(&[("SECID", "SBER".into()), ("LAST", 250.4.into())]),
            row(&[("SECID", "GAZP".into()), ("LAST", 160.1.into())]),
            row(&[("SECID", "LKOH".into()), ("LAST", Value::Null)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_rows() {
        let table = quotes();
        assert_eq!(table.len(), 3);
        assert_eq!(table.column_names().collect::<Vec<_>>(), ["SECID", "LAST"]);
        assert_eq!(table.get(1, "SECID"), Some(&Value::from("GAZP")));
    }

    #[test]
    fn test_from_rows_reordered_columns() {
        let table = Table::from_rows(vec![
            row(&[("a", Value::Integer(1)), ("b", Value::Integer(2))]),
            row(&[("b", Value::Integer(4)), ("a", Value::Integer(3))]),
        ])
        .unwrap();
        assert_eq!(table.get(1, "a"), Some(&Value::Integer(3)));
        assert_eq!(table.get(1, "b"), Some(&Value::Integer(4)));
    }

    #[test]
    fn test_from_rows_schema_mismatch() {
        let err = Table::from_rows(vec![
            row(&[("a", Value::Integer(1)), ("b", Value::Integer(2))]),
            row(&[("a", Value::Integer(3)), ("c", Value::Integer(4))]),
        ])
        .unwrap_err();
        assert!(matches!(err, ParseError::SchemaMismatch { row: 1, .. }));

        let err = Table::from_rows(vec![row(&[("a", Value::Integer(1))]), row(&[])]).unwrap_err();
        assert!(matches!(err, ParseError::SchemaMismatch { row: 1, .. }));
    }

    #[test]
    fn test_from_rows_empty() {
        let table = Table::from_rows(Vec::new()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.width(), 0);
    }

    #[test]
    fn test_categories_first_seen() {
        let column = Column::new(
            "BOARDID",
            vec!["TQBR".into(), Value::Null, "SMAL".into(), "TQBR".into()],
        );
        assert_eq!(
            column.categories(),
            [&Value::from("TQBR"), &Value::from("SMAL")]
        );
    }

    #[test]
    fn test_constant_and_drop_column() {
        let table = quotes().with_constant_column("TICKER", "X");
        assert_eq!(table.width(), 3);
        assert_eq!(table.get(2, "TICKER"), Some(&Value::from("X")));
        let table = table.drop_column("TICKER").drop_column("missing");
        assert_eq!(table.column_names().collect::<Vec<_>>(), ["SECID", "LAST"]);
    }

    #[test]
    fn test_filter_and_head() {
        let table = quotes();
        let priced = table.filter(|r| r.get("LAST").is_some_and(|v| !v.is_null()));
        assert_eq!(priced.len(), 2);
        assert_eq!(table.head(1).len(), 1);
        assert_eq!(table.head(10).len(), 3);
    }

    #[test]
    fn test_concat_unions_columns() {
        let a = Table::from_rows(vec![row(&[("a", Value::Integer(1))])]).unwrap();
        let b = Table::from_rows(vec![row(&[("a", Value::Integer(2)), ("b", "x".into())])]).unwrap();
        let table = Table::concat([a, b]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_names().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(table.get(0, "b"), Some(&Value::Null));
        assert_eq!(table.get(1, "b"), Some(&Value::from("x")));
    }

    #[test]
    fn test_left_join() {
        let boards = Table::from_rows(vec![
            row(&[("SECID", "SBER".into()), ("LAST", "ref".into())]),
            row(&[("SECID", "VTBR".into()), ("LAST", "ref".into())]),
        ])
        .unwrap();
        let quotes = Table::from_rows(vec![
            row(&[("TICKER", "SBER".into()), ("LAST", 250.4.into())]),
            row(&[("TICKER", "GAZP".into()), ("LAST", 160.1.into())]),
        ])
        .unwrap();

        let joined = boards.left_join(&quotes, "SECID", "TICKER").unwrap();
        assert_eq!(joined.len(), 2);
        assert_eq!(
            joined.column_names().collect::<Vec<_>>(),
            ["SECID", "LAST_x", "TICKER", "LAST_y"]
        );
        assert_eq!(joined.get(0, "LAST_y"), Some(&Value::Float(250.4)));
        assert_eq!(joined.get(1, "LAST_y"), Some(&Value::Null));
        assert_eq!(joined.get(1, "TICKER"), Some(&Value::Null));

        let err = boards.left_join(&quotes, "SECID", "NOPE").unwrap_err();
        assert!(matches!(err, ParseError::MissingColumn(name) if name == "NOPE"));
    }

    #[test]
    fn test_left_join_duplicates_matches() {
        let left = Table::from_rows(vec![row(&[("k", Value::Integer(1))])]).unwrap();
        let right = Table::from_rows(vec![
            row(&[("k", Value::Integer(1)), ("v", "a".into())]),
            row(&[("k", Value::Integer(1)), ("v", "b".into())]),
        ])
        .unwrap();
        let joined = left.left_join(&right, "k", "k").unwrap();
        assert_eq!(joined.len(), 2);
        assert_eq!(joined.column_names().collect::<Vec<_>>(), ["k", "v"]);
        assert_eq!(joined.get(1, "v"), Some(&Value::from("b")));
    }

    #[test]
    fn test_index_and_locate() {
        let mut table = quotes();
        assert!(table.set_index("SECID"));
        assert_eq!(table.width(), 1);
        assert!(table.has_column("SECID"));
        let key = Value::from("GAZP");
        assert_eq!(table.locate(&key).collect::<Vec<_>>(), [1]);
        assert_eq!(table.row(1).unwrap().keys().collect::<Vec<_>>(), ["LAST"]);

        let reset = table.reset_index();
        assert_eq!(reset.column_names().collect::<Vec<_>>(), ["SECID", "LAST"]);
        assert!(reset.index().is_none());
    }
}

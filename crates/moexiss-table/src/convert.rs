//! Conversion of parsed rows and blocks into tables.

use indexmap::IndexMap;
use moexiss_types::ParseError;

use crate::{Blocks, NormalizationSpec, Row, Table};

/// Input accepted by [`to_tables`].
#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    /// A single list of rows.
    Rows(Vec<Row>),
    /// Named blocks as produced by [`parse_blocks`](crate::parse_blocks).
    Blocks(Blocks),
}

impl From<Vec<Row>> for TableSource {
    fn from(rows: Vec<Row>) -> Self {
        Self::Rows(rows)
    }
}

impl From<Blocks> for TableSource {
    fn from(blocks: Blocks) -> Self {
        Self::Blocks(blocks)
    }
}

/// Output of [`to_tables`]: one table, or several keyed by block name.
#[derive(Debug, Clone, PartialEq)]
pub enum Tables {
    /// A single table.
    Single(Table),
    /// Tables keyed by block name, in response order.
    Many(IndexMap<String, Table>),
}

impl Tables {
    /// Returns the single table, or `None` for [`Tables::Many`].
    #[must_use]
    pub fn into_single(self) -> Option<Table> {
        match self {
            Self::Single(table) => Some(table),
            Self::Many(_) => None,
        }
    }

    /// Returns the keyed tables. A single table is keyed by `name`.
    #[must_use]
    pub fn into_many(self, name: &str) -> IndexMap<String, Table> {
        match self {
            Self::Single(table) => IndexMap::from([(name.to_string(), table)]),
            Self::Many(tables) => tables,
        }
    }

    /// Normalizes every contained table with the same rules.
    #[must_use]
    pub fn normalize(self, spec: &NormalizationSpec) -> Self {
        match self {
            Self::Single(table) => Self::Single(table.normalize(spec)),
            Self::Many(tables) => Self::Many(
                tables
                    .into_iter()
                    .map(|(name, table)| {
                        let normalized = table.normalize(spec);
                        (name, normalized)
                    })
                    .collect(),
            ),
        }
    }
}

/// Converts rows or blocks into tables.
///
/// - Rows always give [`Tables::Single`]; `block` is ignored.
/// - Blocks with `block` set give [`Tables::Single`] for that block.
/// - Blocks without `block` give [`Tables::Many`] holding every non-empty
///   block.
///
/// # Errors
///
/// - [`ParseError::BlockNotFound`] if the named block is absent
/// - [`ParseError::SchemaMismatch`] if rows do not share one schema
pub fn to_tables(source: impl Into<TableSource>, block: Option<&str>) -> Result<Tables, ParseError> {
    match (source.into(), block) {
        (TableSource::Rows(rows), _) => Table::from_rows(rows).map(Tables::Single),
        (TableSource::Blocks(mut blocks), Some(name)) => {
            let rows = blocks
                .shift_remove(name)
                .ok_or_else(|| ParseError::BlockNotFound(name.to_string()))?;
            Table::from_rows(rows).map(Tables::Single)
        }
        (TableSource::Blocks(blocks), None) => blocks
            .into_iter()
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(name, rows)| Table::from_rows(rows).map(|table| (name, table)))
            .collect::<Result<IndexMap<_, _>, _>>()
            .map(Tables::Many),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Value, parse_blocks};
    use serde_json::json;

    fn document() -> Blocks {
        parse_blocks(json!({
            "securities": {"columns": ["SECID", "BOARDID"], "data": [["SBER", "TQBR"]]},
            "marketdata": {"columns": ["SECID", "LAST"], "data": [["SBER", 250.4]]},
            "dataversion": {"columns": ["version"], "data": []}
        }))
        .unwrap()
    }

    #[test]
    fn test_engines_single_table() {
        let blocks = parse_blocks(json!({
            "engines": {"columns": ["id", "name", "title"], "data": [[1, "stock", "Stock"]]}
        }))
        .unwrap();
        let table = to_tables(blocks, Some("engines"))
            .unwrap()
            .into_single()
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.column_names().collect::<Vec<_>>(), ["id", "name", "title"]);
    }

    #[test]
    fn test_rows_ignore_block_name() {
        let rows = document().shift_remove("securities").unwrap();
        let table = to_tables(rows, Some("whatever"))
            .unwrap()
            .into_single()
            .unwrap();
        assert_eq!(table.get(0, "BOARDID"), Some(&Value::from("TQBR")));
    }

    #[test]
    fn test_block_not_found() {
        let err = to_tables(document(), Some("trades")).unwrap_err();
        assert_eq!(err.to_string(), "Block 'trades' not found in response");
    }

    #[test]
    fn test_named_empty_block() {
        let table = to_tables(document(), Some("dataversion"))
            .unwrap()
            .into_single()
            .unwrap();
        assert!(table.is_empty());
        assert_eq!(table.width(), 0);
    }

    #[test]
    fn test_many_omits_empty_blocks() {
        let tables = to_tables(document(), None).unwrap().into_many("unused");
        assert_eq!(
            tables.keys().map(String::as_str).collect::<Vec<_>>(),
            ["securities", "marketdata"]
        );
    }
}

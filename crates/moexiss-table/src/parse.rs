//! Extraction of named data blocks from ISS responses.
//!
//! An ISS document is a JSON object whose entries are either data blocks
//! (`{"columns": [...], "data": [[...], ...]}`) or auxiliary entries such as
//! cursors and metadata. Each entry is decoded against the strict block
//! schema; anything that does not decode is skipped.

use indexmap::IndexMap;
use log::trace;
use moexiss_types::ParseError;
use serde::Deserialize;
use serde::de::IgnoredAny;

use crate::{Row, Value};

/// Parsed blocks keyed by block name, in response order.
pub type Blocks = IndexMap<String, Vec<Row>>;

#[derive(Debug, Deserialize)]
struct Block {
    columns: Vec<String>,
    data: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Entry {
    Data(Block),
    Other(IgnoredAny),
}

/// Decodes a response body and extracts its data blocks.
///
/// # Errors
///
/// Returns [`ParseError::InvalidJson`] if the body is not JSON, otherwise
/// whatever [`parse_blocks`] reports.
pub fn parse_body(body: &str) -> Result<Blocks, ParseError> {
    let document: serde_json::Value =
        serde_json::from_str(body).map_err(|source| ParseError::InvalidJson {
            source,
            body: body.to_string(),
        })?;
    parse_blocks(document)
}

/// Extracts every data block of a decoded document as a list of rows.
///
/// Each row maps the block's column names to the positionally corresponding
/// values. A block with an empty `data` list yields an empty row list.
///
/// # Errors
///
/// - [`ParseError::NotAMapping`] if the document is not a JSON object
/// - [`ParseError::ColumnCountMismatch`] if a row's length differs from the
///   number of columns
pub fn parse_blocks(document: serde_json::Value) -> Result<Blocks, ParseError> {
    let serde_json::Value::Object(entries) = document else {
        return Err(ParseError::NotAMapping {
            found: json_type(&document),
        });
    };

    let mut blocks = Blocks::new();
    for (name, content) in entries {
        let Ok(Entry::Data(block)) = serde_json::from_value::<Entry>(content) else {
            trace!("Skipping non-block entry '{name}'");
            continue;
        };
        let rows = block_rows(&name, block)?;
        blocks.insert(name, rows);
    }
    Ok(blocks)
}

fn block_rows(name: &str, block: Block) -> Result<Vec<Row>, ParseError> {
    let Block { columns, data } = block;
    let mut rows = Vec::with_capacity(data.len());

    for (position, values) in data.into_iter().enumerate() {
        if values.len() != columns.len() {
            return Err(ParseError::ColumnCountMismatch {
                block: name.to_string(),
                row: position,
                columns: columns.len(),
                values: values.len(),
            });
        }
        rows.push(
            columns
                .iter()
                .cloned()
                .zip(values.into_iter().map(Value::from_json))
                .collect(),
        );
    }

    Ok(rows)
}

const fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_block() {
        let blocks = parse_blocks(json!({
            "engines": {
                "columns": ["id", "name", "title"],
                "data": [[1, "stock", "Фондовый рынок"]]
            }
        }))
        .unwrap();

        let rows = &blocks["engines"];
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id"), Some(&Value::Integer(1)));
        assert_eq!(rows[0].get("name"), Some(&Value::from("stock")));
        assert_eq!(rows[0].keys().collect::<Vec<_>>(), ["id", "name", "title"]);
    }

    #[test]
    fn test_multi_row_block() {
        let blocks = parse_blocks(json!({
            "history": {
                "columns": ["TRADEDATE", "SECID", "CLOSE", "VOLUME", "WAPRICE"],
                "data": [
                    ["2024-01-15", "SBER", 271.5, 1000, null],
                    ["2024-01-16", "SBER", 270, 0, 270.8],
                    ["2024-01-17", "SBER", null, 2500, "n/a"]
                ]
            }
        }))
        .unwrap();

        let rows = &blocks["history"];
        assert_eq!(rows.len(), 3);
        for row in rows {
            assert_eq!(
                row.keys().collect::<Vec<_>>(),
                ["TRADEDATE", "SECID", "CLOSE", "VOLUME", "WAPRICE"]
            );
        }
        let dates: Vec<_> = rows
            .iter()
            .map(|row| row.get("TRADEDATE").and_then(Value::as_str))
            .collect();
        assert_eq!(dates, [Some("2024-01-15"), Some("2024-01-16"), Some("2024-01-17")]);

        assert_eq!(rows[0].get("CLOSE"), Some(&Value::Float(271.5)));
        assert_eq!(rows[0].get("WAPRICE"), Some(&Value::Null));
        assert_eq!(rows[1].get("CLOSE"), Some(&Value::Integer(270)));
        assert_eq!(rows[1].get("VOLUME"), Some(&Value::Integer(0)));
        assert_eq!(rows[2].get("CLOSE"), Some(&Value::Null));
        assert_eq!(rows[2].get("WAPRICE"), Some(&Value::from("n/a")));
    }

    #[test]
    fn test_blocks_keep_response_order() {
        let blocks = parse_body(
            r#"{"securities": {"columns": ["SECID"], "data": [["SBER"]]},
                "marketdata": {"columns": ["LAST"], "data": [[250.4]]},
                "dataversion": {"columns": ["version"], "data": [[1]]}}"#,
        )
        .unwrap();
        assert_eq!(
            blocks.keys().map(String::as_str).collect::<Vec<_>>(),
            ["securities", "marketdata", "dataversion"]
        );
    }

    #[test]
    fn test_non_block_entries_skipped() {
        let blocks = parse_blocks(json!({
            "securities": {"columns": ["SECID"], "data": [["SBER"]]},
            "securities.cursor": {"INDEX": 0, "TOTAL": 1},
            "metadata": ["not", "a", "block"],
            "half": {"columns": ["a"]},
            "scalar": 5
        }))
        .unwrap();

        assert_eq!(blocks.keys().collect::<Vec<_>>(), ["securities"]);
    }

    #[test]
    fn test_empty_block() {
        let blocks = parse_blocks(json!({
            "trades": {"columns": ["TRADENO", "PRICE"], "data": []}
        }))
        .unwrap();
        assert!(blocks["trades"].is_empty());
    }

    #[test]
    fn test_column_count_mismatch() {
        let err = parse_blocks(json!({
            "b": {"columns": ["a", "b"], "data": [[1, 2], [1]]}
        }))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Column count mismatch in block 'b': 2 columns defined but row 1 has 1 values"
        );
    }

    #[test]
    fn test_not_a_mapping() {
        let err = parse_blocks(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, ParseError::NotAMapping { found: "array" }));
    }

    #[test]
    fn test_parse_body_invalid_json() {
        let err = parse_body("<html>").unwrap_err();
        match err {
            ParseError::InvalidJson { body, .. } => assert_eq!(body, "<html>"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_body("{}").unwrap().is_empty());
    }
}

//! Benchmark fixtures for moexiss.
//!
//! Builds synthetic ISS response bodies of a chosen size so the parsing
//! pipeline can be measured without network access.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::{Value, json};

/// Columns of a candles block, as returned by ISS.
pub const CANDLE_COLUMNS: [&str; 8] =
    ["open", "close", "high", "low", "value", "volume", "begin", "end"];

/// Shape of a synthetic response.
#[derive(Debug, Clone)]
pub struct FixtureConfig {
    /// Number of candle rows.
    pub rows: usize,
    /// Whether prices are sent as strings rather than numbers.
    pub text_prices: bool,
    /// Whether to append a `candles.cursor` block.
    pub with_cursor: bool,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            rows: 1_000,
            text_prices: false,
            with_cursor: true,
        }
    }
}

fn first_candle() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .and_then(|d| d.and_hms_opt(10, 0, 0))
        .unwrap_or_default()
}

/// Builds a minute-candles response body.
pub fn candles_body(config: &FixtureConfig) -> String {
    let start = first_candle();
    let data: Vec<Value> = (0..config.rows)
        .map(|i| {
            let begin = start + Duration::minutes(i as i64);
            let end = begin + Duration::seconds(59);
            let close = 270.0 + (i % 100) as f64 * 0.01;
            let price = |p: f64| {
                if config.text_prices {
                    json!(format!("{p:.2}"))
                } else {
                    json!(p)
                }
            };
            json!([
                price(close - 0.05),
                price(close),
                price(close + 0.1),
                price(close - 0.1),
                close * 1_000.0,
                1_000 + i,
                begin.format("%Y-%m-%d %H:%M:%S").to_string(),
                end.format("%Y-%m-%d %H:%M:%S").to_string(),
            ])
        })
        .collect();

    let mut body = json!({
        "candles": { "columns": CANDLE_COLUMNS, "data": data },
    });
    if config.with_cursor {
        body["candles.cursor"] = json!({
            "columns": ["INDEX", "TOTAL", "PAGESIZE"],
            "data": [[0, config.rows, 500]],
        });
    }
    body.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use moexiss_lib::{parse_body, to_tables};

    #[test]
    fn test_candles_body_parses() {
        let body = candles_body(&FixtureConfig {
            rows: 3,
            ..Default::default()
        });
        let blocks = parse_body(&body).unwrap();
        assert_eq!(blocks["candles"].len(), 3);
        assert_eq!(blocks["candles.cursor"].len(), 1);

        let table = to_tables(blocks, Some("candles")).unwrap().into_single().unwrap();
        assert_eq!(table.width(), CANDLE_COLUMNS.len());
        assert_eq!(
            table.get(1, "begin").and_then(|v| v.as_str()),
            Some("2024-01-15 10:01:00")
        );
    }

    #[test]
    fn test_text_prices() {
        let body = candles_body(&FixtureConfig {
            rows: 1,
            text_prices: true,
            with_cursor: false,
        });
        let blocks = parse_body(&body).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(
            blocks["candles"][0].get("close").and_then(|v| v.as_str()),
            Some("270.00")
        );
    }
}

//! Higher-level functions combining one or more resource calls.

use indexmap::IndexMap;
use log::warn;
use moexiss_table::{NormalizationSpec, Table, Tables, Value};
use moexiss_types::{CandleInterval, DateInput, Result};

use crate::{BoardPath, CandleQuery, CandleSource, HistoryQuery, IssClient, SecurityScope};

/// Main share board.
pub const DEFAULT_STOCK_BOARD: &str = "TQBR";

/// Main government bond board.
pub const DEFAULT_BOND_BOARD: &str = "TQOB";

/// Moscow Exchange index.
pub const DEFAULT_INDEX: &str = "IMOEX";

/// Column added to snapshot rows naming the requested ticker.
pub const TICKER_COLUMN: &str = "TICKER";

/// Columns of the snapshot returned when no ticker could be fetched.
pub const SNAPSHOT_COLUMNS: [&str; 7] = ["TICKER", "LAST", "CHANGE", "VOLTODAY", "OPEN", "LOW", "HIGH"];

/// Column types of a `candles` block.
#[must_use]
pub fn candle_normalization() -> NormalizationSpec {
    NormalizationSpec::new()
        .with_dates(["begin", "end"])
        .with_numeric(["open", "close", "high", "low", "value", "volume"])
}

/// Column types of a `history` block.
#[must_use]
pub fn history_normalization() -> NormalizationSpec {
    NormalizationSpec::new()
        .with_dates(["TRADEDATE"])
        .with_numeric([
            "OPEN",
            "LOW",
            "HIGH",
            "CLOSE",
            "LEGALCLOSEPRICE",
            "WAPRICE",
            "VOLUME",
            "VALUE",
            "NUMTRADES",
        ])
        .with_categorical(["BOARDID"])
}

/// Lists shares traded on a stock board.
///
/// # Errors
///
/// Propagates request and parse errors.
pub fn get_stock_securities(client: &IssClient, board: &str) -> Result<Table> {
    client.securities(SecurityScope::Board(BoardPath::new("stock", "shares", board)))
}

/// Lists bonds traded on a bond board.
///
/// # Errors
///
/// Propagates request and parse errors.
pub fn get_bond_securities(client: &IssClient, board: &str) -> Result<Table> {
    client.securities(SecurityScope::Board(BoardPath::new("stock", "bonds", board)))
}

/// Returns trading history for a ticker, or its description blocks when
/// `market_data` is false.
///
/// # Errors
///
/// Propagates validation, request and parse errors.
pub fn get_security_history(
    client: &IssClient,
    ticker: &str,
    start: Option<DateInput>,
    end: Option<DateInput>,
    at: BoardPath<'_>,
    market_data: bool,
) -> Result<Tables> {
    if !market_data {
        return client.security_info(ticker).map(Tables::Many);
    }
    let query = HistoryQuery::new(ticker, at.engine, at.market)
        .with_board(at.board)
        .with_dates(start, end);
    client.market_history(&query).map(Tables::Single)
}

/// Returns share candles for an interval name such as `"hour"` or `"day"`.
///
/// # Errors
///
/// Returns a validation error for an unknown interval or bad dates,
/// otherwise propagates request and parse errors.
pub fn get_stock_candles(
    client: &IssClient,
    ticker: &str,
    interval: &str,
    start: Option<DateInput>,
    end: Option<DateInput>,
    board: &str,
) -> Result<Table> {
    let interval: CandleInterval = interval.parse()?;
    let query = CandleQuery::new(ticker, "stock", "shares")
        .with_interval(interval)
        .with_dates(start, end)
        .with_source(CandleSource::Board(board));
    client.candles(&query)
}

/// Lists the constituents of an index.
///
/// # Errors
///
/// Propagates request and parse errors.
pub fn get_index_composition(client: &IssClient, index: &str) -> Result<Table> {
    client.index_components(index)
}

/// Searches for securities.
///
/// Without a market the exchange-wide search is used. With an
/// `(engine, market)` pair the market's securities are fetched and filtered
/// locally by a case-insensitive substring match on `SECID` or `SHORTNAME`.
///
/// # Errors
///
/// Propagates request and parse errors.
pub fn find_security(client: &IssClient, query: &str, market: Option<(&str, &str)>) -> Result<Table> {
    let Some((engine, market)) = market else {
        return client.securities(SecurityScope::Search(query));
    };

    let securities = client.securities(SecurityScope::Market { engine, market })?;
    let needle = query.to_lowercase();
    let matches = |value: Option<&Value>| {
        value
            .and_then(Value::as_str)
            .is_some_and(|s| s.to_lowercase().contains(&needle))
    };
    Ok(securities.filter(|row| matches(row.get("SECID")) || matches(row.get("SHORTNAME"))))
}

/// Fetches market data for several tickers into one table.
///
/// Each ticker's rows get a `TICKER` column. Tickers that fail are logged
/// and skipped. When nothing succeeds the result is an empty table with
/// the [`SNAPSHOT_COLUMNS`].
pub fn get_market_data_snapshot<S: AsRef<str>>(client: &IssClient, tickers: &[S], at: BoardPath<'_>) -> Table {
    get_market_data_snapshot_with(client, tickers, at, |_| {})
}

/// Like [`get_market_data_snapshot`], calling `progress` after each ticker.
pub fn get_market_data_snapshot_with<S, F>(
    client: &IssClient,
    tickers: &[S],
    at: BoardPath<'_>,
    mut progress: F,
) -> Table
where
    S: AsRef<str>,
    F: FnMut(&str),
{
    let mut fetched = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        let ticker = ticker.as_ref();
        match client.market_data(ticker, Some(at)) {
            Ok(table) => fetched.push(table.with_constant_column(TICKER_COLUMN, ticker)),
            Err(e) => warn!("Error fetching data for {ticker}: {e}"),
        }
        progress(ticker);
    }

    if fetched.is_empty() {
        return Table::empty_with_columns(SNAPSHOT_COLUMNS);
    }
    Table::concat(fetched)
}

/// Lists the securities of a board joined with their market data.
///
/// The join is a left join on `SECID == TICKER`; the `TICKER` column is
/// dropped afterwards. If no market data could be fetched the plain list
/// is returned.
///
/// # Errors
///
/// Propagates errors from fetching the securities list.
pub fn get_board_securities_with_market_data(client: &IssClient, at: BoardPath<'_>) -> Result<Table> {
    let securities = client.securities(SecurityScope::Board(at))?;
    let tickers: Vec<String> = securities
        .column("SECID")
        .map(|c| c.values().iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();

    let market_data = get_market_data_snapshot(client, &tickers, at);
    if market_data.is_empty() {
        return Ok(securities);
    }

    Ok(securities
        .left_join(&market_data, "SECID", TICKER_COLUMN)?
        .drop_column(TICKER_COLUMN))
}

/// Fetches share candles for several interval names.
///
/// Results keep the requested interval order. Unknown interval names and
/// failed requests are logged and skipped.
pub fn get_multi_timeframe_candles<S: AsRef<str>>(
    client: &IssClient,
    ticker: &str,
    intervals: &[S],
    start: Option<DateInput>,
    end: Option<DateInput>,
    board: &str,
) -> IndexMap<String, Table> {
    let mut result = IndexMap::new();
    for interval in intervals {
        let interval = interval.as_ref();
        match get_stock_candles(client, ticker, interval, start.clone(), end.clone(), board) {
            Ok(table) => {
                result.insert(interval.to_string(), table);
            }
            Err(e) => warn!("Error with interval '{interval}': {e}"),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use moexiss_table::{ColumnKind, parse_body, to_tables};

    fn table(body: &str, block: &str) -> Table {
        to_tables(parse_body(body).unwrap(), Some(block))
            .unwrap()
            .into_single()
            .unwrap()
    }

    #[test]
    fn test_candle_normalization() {
        let candles = table(
            r#"{"candles": {"columns": ["open", "close", "volume", "begin", "end"],
                "data": [["270.1", 271.5, 120, "2024-01-15 10:00:00", "2024-01-15 10:59:59"]]}}"#,
            "candles",
        )
        .normalize(&candle_normalization());

        for name in ["begin", "end"] {
            assert_eq!(candles.column(name).unwrap().kind(), ColumnKind::DateTime);
        }
        assert_eq!(candles.column("open").unwrap().kind(), ColumnKind::Numeric);
        assert_eq!(candles.get(0, "open"), Some(&Value::Float(270.1)));
        assert!(candles.get(0, "begin").and_then(Value::as_datetime).is_some());
        assert!(candles.index().is_none());
    }

    #[test]
    fn test_history_normalization() {
        let history = table(
            r#"{"history": {"columns": ["BOARDID", "TRADEDATE", "SECID", "CLOSE"],
                "data": [["TQBR", "2024-01-15", "SBER", 271.5], ["TQBR", "2024-01-16", "SBER", null]]}}"#,
            "history",
        )
        .normalize(&history_normalization());

        assert_eq!(history.column("TRADEDATE").unwrap().kind(), ColumnKind::DateTime);
        assert_eq!(history.column("BOARDID").unwrap().kind(), ColumnKind::Categorical);
        assert_eq!(history.column("SECID").unwrap().kind(), ColumnKind::Raw);
        assert_eq!(history.get(1, "CLOSE"), Some(&Value::Null));
    }
}

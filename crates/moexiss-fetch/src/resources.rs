//! Typed wrappers for individual ISS resources.

use indexmap::IndexMap;
use moexiss_table::Table;
use moexiss_types::{CandleInterval, DateInput, Result, format_date, validate_date_range};

use crate::url::Params;
use crate::{IssClient, Request};

/// Engine, market and board triple locating securities on the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardPath<'a> {
    /// Trading engine, e.g. `stock`.
    pub engine: &'a str,
    /// Market, e.g. `shares`.
    pub market: &'a str,
    /// Board, e.g. `TQBR`.
    pub board: &'a str,
}

impl<'a> BoardPath<'a> {
    /// The main share board.
    pub const TQBR: BoardPath<'static> = BoardPath::new("stock", "shares", "TQBR");

    /// Creates a board path.
    #[must_use]
    pub const fn new(engine: &'a str, market: &'a str, board: &'a str) -> Self {
        Self {
            engine,
            market,
            board,
        }
    }
}

/// Which securities list to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityScope<'a> {
    /// Every security on the exchange.
    #[default]
    All,
    /// Full-text search by code or name.
    Search(&'a str),
    /// Securities of one market.
    Market {
        /// Trading engine.
        engine: &'a str,
        /// Market.
        market: &'a str,
    },
    /// Securities of one board.
    Board(BoardPath<'a>),
}

/// Where candles are taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CandleSource<'a> {
    /// The security's primary board.
    #[default]
    Primary,
    /// A specific board.
    Board(&'a str),
    /// A board group.
    BoardGroup(&'a str),
}

/// Parameters of a candles request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleQuery<'a> {
    /// Security code.
    pub security: &'a str,
    /// Trading engine.
    pub engine: &'a str,
    /// Market.
    pub market: &'a str,
    /// Candle interval.
    pub interval: CandleInterval,
    /// First date, inclusive.
    pub start: Option<DateInput>,
    /// Last date, inclusive; today when only `start` is set.
    pub end: Option<DateInput>,
    /// Board or board group.
    pub source: CandleSource<'a>,
}

impl<'a> CandleQuery<'a> {
    /// Creates a daily candles query on the primary board.
    #[must_use]
    pub const fn new(security: &'a str, engine: &'a str, market: &'a str) -> Self {
        Self {
            security,
            engine,
            market,
            interval: CandleInterval::Day,
            start: None,
            end: None,
            source: CandleSource::Primary,
        }
    }

    /// Sets the interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: CandleInterval) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the date range.
    #[must_use]
    pub fn with_dates(mut self, start: Option<DateInput>, end: Option<DateInput>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Sets the candle source.
    #[must_use]
    pub const fn with_source(mut self, source: CandleSource<'a>) -> Self {
        self.source = source;
        self
    }
}

/// Parameters of a trading history request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery<'a> {
    /// Security code.
    pub security: &'a str,
    /// Trading engine.
    pub engine: &'a str,
    /// Market.
    pub market: &'a str,
    /// Board; all boards when `None`.
    pub board: Option<&'a str>,
    /// First date, inclusive.
    pub start: Option<DateInput>,
    /// Last date, inclusive.
    pub end: Option<DateInput>,
    /// Columns to request; all when empty.
    pub columns: Vec<String>,
}

impl<'a> HistoryQuery<'a> {
    /// Creates a history query over all boards and dates.
    #[must_use]
    pub const fn new(security: &'a str, engine: &'a str, market: &'a str) -> Self {
        Self {
            security,
            engine,
            market,
            board: None,
            start: None,
            end: None,
            columns: Vec::new(),
        }
    }

    /// Restricts the query to one board.
    #[must_use]
    pub const fn with_board(mut self, board: &'a str) -> Self {
        self.board = Some(board);
        self
    }

    /// Sets the date range.
    #[must_use]
    pub fn with_dates(mut self, start: Option<DateInput>, end: Option<DateInput>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Sets the columns to request.
    #[must_use]
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }
}

/// `from`/`till` parameters for an optional range; empty when both ends
/// are absent.
fn date_params(start: Option<&DateInput>, end: Option<&DateInput>) -> Result<Params> {
    if start.is_none() && end.is_none() {
        return Ok(Params::new());
    }
    let range = validate_date_range(start.cloned(), end.cloned(), None)?;
    Ok(Params::new()
        .with("from", range.from_param())
        .with("till", range.till_param()))
}

impl IssClient {
    /// Lists trading engines.
    ///
    /// # Errors
    ///
    /// Propagates request and parse errors.
    pub fn engines(&self) -> Result<Table> {
        self.get_table(&Request::get("/engines"), "engines")
    }

    /// Lists the markets of an engine.
    ///
    /// # Errors
    ///
    /// Propagates request and parse errors.
    pub fn markets(&self, engine: &str) -> Result<Table> {
        let request = Request::get("/engines/[engine]/markets").path("engine", engine);
        self.get_table(&request, "markets")
    }

    /// Lists the boards of a market.
    ///
    /// # Errors
    ///
    /// Propagates request and parse errors.
    pub fn boards(&self, engine: &str, market: &str) -> Result<Table> {
        let request = Request::get("/engines/[engine]/markets/[market]/boards")
            .path("engine", engine)
            .path("market", market);
        self.get_table(&request, "boards")
    }

    /// Lists securities in the given scope.
    ///
    /// # Errors
    ///
    /// Propagates request and parse errors.
    pub fn securities(&self, scope: SecurityScope<'_>) -> Result<Table> {
        let request = match scope {
            SecurityScope::All => Request::get("/securities"),
            SecurityScope::Search(query) => Request::get("/securities").param("q", query),
            SecurityScope::Market { engine, market } => {
                Request::get("/engines/[engine]/markets/[market]/securities")
                    .path("engine", engine)
                    .path("market", market)
            }
            SecurityScope::Board(at) => {
                Request::get("/engines/[engine]/markets/[market]/boards/[board]/securities")
                    .path("engine", at.engine)
                    .path("market", at.market)
                    .path("board", at.board)
            }
        };
        self.get_table(&request, "securities")
    }

    /// Returns every non-empty block describing a security (`description`,
    /// `boards`, ...) in response order.
    ///
    /// # Errors
    ///
    /// Propagates request and parse errors.
    pub fn security_info(&self, security: &str) -> Result<IndexMap<String, Table>> {
        let request = Request::get("/securities/[security]").path("security", security);
        Ok(self.get_tables(&request, None, None)?.into_many(security))
    }

    /// Returns current market data for a security, on one board when given.
    ///
    /// # Errors
    ///
    /// Propagates request and parse errors.
    pub fn market_data(&self, security: &str, board: Option<BoardPath<'_>>) -> Result<Table> {
        let request = match board {
            Some(at) => Request::get(
                "/engines/[engine]/markets/[market]/boards/[board]/securities/[security]",
            )
            .path("engine", at.engine)
            .path("market", at.market)
            .path("board", at.board),
            None => Request::get("/securities/[security]/marketdata"),
        }
        .path("security", security);
        self.get_table(&request, "marketdata")
    }

    /// Returns the order book of a security.
    ///
    /// # Errors
    ///
    /// Propagates request and parse errors.
    pub fn orderbook(&self, security: &str, at: BoardPath<'_>, depth: u32) -> Result<Table> {
        let request = Request::get(
            "/engines/[engine]/markets/[market]/boards/[board]/securities/[security]/orderbook",
        )
        .path("engine", at.engine)
        .path("market", at.market)
        .path("board", at.board)
        .path("security", security)
        .param("depth", depth);
        self.get_table(&request, "orderbook")
    }

    /// Returns recent trades of a security.
    ///
    /// # Errors
    ///
    /// Propagates request and parse errors.
    pub fn trades(
        &self,
        security: &str,
        engine: &str,
        market: &str,
        board: Option<&str>,
        limit: u32,
    ) -> Result<Table> {
        let request = match board {
            Some(board) => Request::get(
                "/engines/[engine]/markets/[market]/boards/[board]/securities/[security]/trades",
            )
            .path("board", board),
            None => Request::get("/engines/[engine]/markets/[market]/securities/[security]/trades"),
        }
        .path("engine", engine)
        .path("market", market)
        .path("security", security)
        .param("limit", limit);
        self.get_table(&request, "trades")
    }

    /// Returns OHLCV candles.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad dates, otherwise propagates
    /// request and parse errors.
    pub fn candles(&self, query: &CandleQuery<'_>) -> Result<Table> {
        let params = date_params(query.start.as_ref(), query.end.as_ref())?
            .with("interval", query.interval.code());
        let request = match query.source {
            CandleSource::Board(board) => Request::get(
                "/engines/[engine]/markets/[market]/boards/[board]/securities/[security]/candles",
            )
            .path("board", board),
            CandleSource::BoardGroup(group) => Request::get(
                "/engines/[engine]/markets/[market]/boardgroups/[boardgroup]/securities/[security]/candles",
            )
            .path("boardgroup", group),
            CandleSource::Primary => {
                Request::get("/engines/[engine]/markets/[market]/securities/[security]/candles")
            }
        }
        .path("engine", query.engine)
        .path("market", query.market)
        .path("security", query.security)
        .params(params);
        self.get_table(&request, "candles")
    }

    /// Returns daily trading history of a security.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad dates, otherwise propagates
    /// request and parse errors.
    pub fn market_history(&self, query: &HistoryQuery<'_>) -> Result<Table> {
        let mut params = date_params(query.start.as_ref(), query.end.as_ref())?;
        if !query.columns.is_empty() {
            params.set("columns", query.columns.clone());
        }
        let request = match query.board {
            Some(board) => Request::get(
                "/history/engines/[engine]/markets/[market]/boards/[board]/securities/[security]",
            )
            .path("board", board),
            None => Request::get("/history/engines/[engine]/markets/[market]/securities/[security]"),
        }
        .path("engine", query.engine)
        .path("market", query.market)
        .path("security", query.security)
        .params(params);
        self.get_table(&request, "history")
    }

    /// Returns one day of trading history for every security on a board;
    /// the latest trading day when `date` is `None`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad date, otherwise propagates
    /// request and parse errors.
    pub fn board_history(&self, at: BoardPath<'_>, date: Option<DateInput>) -> Result<Table> {
        let date = date.map(format_date).transpose()?;
        let request =
            Request::get("/history/engines/[engine]/markets/[market]/boards/[board]/securities")
                .path("engine", at.engine)
                .path("market", at.market)
                .path("board", at.board)
                .param("date", date);
        self.get_table(&request, "history")
    }

    /// Lists the indices calculated by the exchange.
    ///
    /// # Errors
    ///
    /// Propagates request and parse errors.
    pub fn indices(&self) -> Result<Table> {
        let request = Request::get("/statistics/engines/stock/markets/index/analytics");
        self.get_table(&request, "indices")
    }

    /// Lists the constituents of an index.
    ///
    /// # Errors
    ///
    /// Propagates request and parse errors.
    pub fn index_components(&self, index: &str) -> Result<Table> {
        let request =
            Request::get("/statistics/engines/stock/markets/index/analytics/[indexid]/tickers")
                .path("indexid", index);
        self.get_table(&request, "tickers")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_params_absent() {
        assert!(date_params(None, None).unwrap().is_empty());
    }

    #[test]
    fn test_date_params_normalized() {
        let start = DateInput::from("01.01.2024");
        let end = DateInput::from("2024/01/31");
        let query = date_params(Some(&start), Some(&end)).unwrap().to_query();
        assert_eq!(
            query,
            [
                ("from".to_string(), "2024-01-01".to_string()),
                ("till".to_string(), "2024-01-31".to_string()),
            ]
        );
    }

    #[test]
    fn test_date_params_reversed() {
        let start = DateInput::from("2024-03-10");
        let end = DateInput::from("2024-01-01");
        let err = date_params(Some(&start), Some(&end)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Start date (2024-03-10) is after end date (2024-01-01)"
        );
    }

    #[test]
    fn test_candle_query_builder() {
        let query = CandleQuery::new("SBER", "stock", "shares")
            .with_interval(CandleInterval::Hour)
            .with_source(CandleSource::Board("TQBR"));
        assert_eq!(query.interval.code(), 60);
        assert_eq!(query.source, CandleSource::Board("TQBR"));
        assert!(query.start.is_none());
    }
}

//! Memoized candle requests.

use std::num::NonZeroUsize;

use chrono::NaiveDate;
use log::debug;
use lru::LruCache;
use moexiss_table::Table;
use moexiss_types::{CandleInterval, DateInput, Result};

use crate::{CandleQuery, CandleSource, IssClient};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CandleKey {
    ticker: String,
    interval: CandleInterval,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    board: String,
}

/// Caches share candle tables per (ticker, interval, start, end, board).
///
/// Holds at most [`CachedCandles::DEFAULT_CAPACITY`] tables unless built with
/// [`CachedCandles::with_capacity`]; the least recently used entry is evicted
/// first.
#[derive(Debug)]
pub struct CachedCandles<'a> {
    client: &'a IssClient,
    entries: LruCache<CandleKey, Table>,
}

impl<'a> CachedCandles<'a> {
    /// Number of tables kept by [`CachedCandles::new`].
    pub const DEFAULT_CAPACITY: usize = 128;

    /// Creates an empty cache over a client.
    #[must_use]
    pub fn new(client: &'a IssClient) -> Self {
        Self::with_capacity(client, Self::DEFAULT_CAPACITY)
    }

    /// Creates an empty cache holding at most `capacity` tables (minimum 1).
    #[must_use]
    pub fn with_capacity(client: &'a IssClient, capacity: usize) -> Self {
        Self {
            client,
            entries: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Returns cached candles, fetching them on first use.
    ///
    /// Dates are resolved before lookup, so `"15.01.2024"` and
    /// `"2024-01-15"` share an entry.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad dates and propagates request
    /// errors on a miss. Failures are not cached.
    pub fn get(
        &mut self,
        ticker: &str,
        interval: CandleInterval,
        start: Option<DateInput>,
        end: Option<DateInput>,
        board: &str,
    ) -> Result<&Table> {
        let key = CandleKey {
            ticker: ticker.to_string(),
            interval,
            start: start.as_ref().map(DateInput::to_date).transpose()?,
            end: end.as_ref().map(DateInput::to_date).transpose()?,
            board: board.to_string(),
        };

        if self.entries.contains(&key) {
            debug!("Candle cache hit for {ticker} {interval}");
        } else {
            debug!("Candle cache miss for {ticker} {interval}");
        }

        let client = self.client;
        self.entries.try_get_or_insert(key, || {
            let query = CandleQuery::new(ticker, "stock", "shares")
                .with_interval(interval)
                .with_dates(start, end)
                .with_source(CandleSource::Board(board));
            client.candles(&query)
        })
    }

    /// Returns the maximum number of cached tables.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Returns the number of cached tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every cached table.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

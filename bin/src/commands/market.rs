//! Live market data commands.

use crate::display::{emit, progress_bar};
use crate::{BoardArgs, OutputArgs};
use anyhow::Result;
use log::info;
use moexiss_lib::endpoints;
use moexiss_lib::prelude::*;

pub(crate) fn quote(
    client: &IssClient,
    security: &str,
    board: Option<BoardPath<'_>>,
    output: &OutputArgs,
) -> Result<()> {
    emit(&client.market_data(security, board)?, output)
}

/// Fetch market data for every ticker, skipping failures.
pub(crate) fn snapshot(
    client: &IssClient,
    tickers: &[String],
    at: BoardPath<'_>,
    output: &OutputArgs,
    quiet: bool,
) -> Result<()> {
    let progress = progress_bar(tickers.len() as u64, quiet);
    let table = endpoints::get_market_data_snapshot_with(client, tickers, at, |ticker| {
        progress.set_message(ticker.to_string());
        progress.inc(1);
    });
    progress.finish_with_message(format!("Fetched {} of {} tickers", table.len(), tickers.len()));
    info!("Snapshot on {} has {} rows", at.board, table.len());

    emit(&table, output)
}

pub(crate) fn orderbook(
    client: &IssClient,
    security: &str,
    at: BoardPath<'_>,
    depth: u32,
    output: &OutputArgs,
) -> Result<()> {
    emit(&client.orderbook(security, at, depth)?, output)
}

pub(crate) fn trades(
    client: &IssClient,
    security: &str,
    board: &BoardArgs,
    any_board: bool,
    limit: u32,
    output: &OutputArgs,
) -> Result<()> {
    let board_code = (!any_board).then_some(board.board.as_str());
    let table = client.trades(security, &board.engine, &board.market, board_code, limit)?;
    emit(&table, output)
}

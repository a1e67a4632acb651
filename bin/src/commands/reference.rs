//! Reference data commands: engines, markets, boards, securities and indices.

use crate::OutputArgs;
use crate::display::{emit, print_table};
use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use indicatif::ProgressBar;
use moexiss_lib::endpoints::{self, DEFAULT_BOND_BOARD, DEFAULT_STOCK_BOARD};
use moexiss_lib::prelude::*;
use std::time::Duration;

/// Preset security lists.
#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum SecurityKind {
    /// Shares on the main board
    Stocks,
    /// Government bonds
    Bonds,
}

pub(crate) fn engines(client: &IssClient, output: &OutputArgs) -> Result<()> {
    emit(&client.engines()?, output)
}

pub(crate) fn markets(client: &IssClient, engine: &str, output: &OutputArgs) -> Result<()> {
    emit(&client.markets(engine)?, output)
}

pub(crate) fn boards(client: &IssClient, engine: &str, market: &str, output: &OutputArgs) -> Result<()> {
    emit(&client.boards(engine, market)?, output)
}

/// List securities of a preset board, optionally joined with market data.
pub(crate) fn securities(
    client: &IssClient,
    kind: SecurityKind,
    board: Option<&str>,
    with_market_data: bool,
    output: &OutputArgs,
    quiet: bool,
) -> Result<()> {
    let (market, default_board) = match kind {
        SecurityKind::Stocks => ("shares", DEFAULT_STOCK_BOARD),
        SecurityKind::Bonds => ("bonds", DEFAULT_BOND_BOARD),
    };
    let board = board.unwrap_or(default_board);

    let table = if with_market_data {
        let spinner = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        spinner.set_message(format!("Fetching market data for {board}"));
        spinner.enable_steady_tick(Duration::from_millis(100));
        let table = endpoints::get_board_securities_with_market_data(
            client,
            BoardPath::new("stock", market, board),
        );
        spinner.finish_and_clear();
        table?
    } else {
        match kind {
            SecurityKind::Stocks => endpoints::get_stock_securities(client, board)?,
            SecurityKind::Bonds => endpoints::get_bond_securities(client, board)?,
        }
    };

    emit(&table, output)
}

pub(crate) fn search(
    client: &IssClient,
    query: &str,
    market: Option<(&str, &str)>,
    output: &OutputArgs,
) -> Result<()> {
    let table = endpoints::find_security(client, query, market)?;
    if table.is_empty() && output.output.is_none() {
        println!("No securities found.");
        return Ok(());
    }
    emit(&table, output)
}

/// Show the description blocks of a security.
pub(crate) fn info(
    client: &IssClient,
    security: &str,
    block: Option<&str>,
    output: &OutputArgs,
) -> Result<()> {
    let mut blocks = client.security_info(security)?;

    if let Some(name) = block {
        let table = blocks
            .shift_remove(name)
            .with_context(|| format!("Block '{name}' not found for {security}"))?;
        return emit(&table, output);
    }
    if output.output.is_some() {
        bail!("--block is required together with --output");
    }

    for (name, table) in &blocks {
        println!("== {name} ==");
        print_table(table, output.limit);
        println!();
    }
    Ok(())
}

pub(crate) fn indices(client: &IssClient, output: &OutputArgs) -> Result<()> {
    emit(&client.indices()?, output)
}

pub(crate) fn index(client: &IssClient, index: &str, output: &OutputArgs) -> Result<()> {
    emit(&endpoints::get_index_composition(client, index)?, output)
}

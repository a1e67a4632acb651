//! Historical data commands: candles and trading history.

use crate::display::{emit, print_table, write_table};
use crate::{DateArgs, OutputArgs};
use anyhow::{Result, bail};
use moexiss_lib::endpoints;
use moexiss_lib::prelude::*;
use std::path::PathBuf;

/// Download candles for one or more intervals, typed for file output.
///
/// With several intervals, failing ones are skipped and each result is
/// written to `<stem>_<interval>.<ext>` next to the requested output.
pub(crate) fn candles(
    client: &IssClient,
    security: &str,
    intervals: &[String],
    dates: &DateArgs,
    board: &str,
    output: &OutputArgs,
) -> Result<()> {
    if let [interval] = intervals {
        let table = endpoints::get_stock_candles(
            client,
            security,
            interval,
            dates.start(),
            dates.end(),
            board,
        )?;
        return emit(&table.normalize(&endpoints::candle_normalization()), output);
    }

    let tables = endpoints::get_multi_timeframe_candles(
        client,
        security,
        intervals,
        dates.start(),
        dates.end(),
        board,
    );
    if tables.is_empty() {
        bail!("No candles could be fetched for {security}");
    }

    let spec = endpoints::candle_normalization();
    for (interval, table) in &tables {
        let table = table.normalize(&spec);
        match &output.output {
            Some(path) => write_table(&table, &interval_path(path, interval), output.format)?,
            None => {
                println!("== {security} {interval} ==");
                print_table(&table, output.limit);
                println!();
            }
        }
    }
    Ok(())
}

fn interval_path(path: &std::path::Path, interval: &str) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("candles");
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_{interval}.{ext}"),
        None => format!("{stem}_{interval}"),
    };
    path.with_file_name(name)
}

pub(crate) fn history(
    client: &IssClient,
    security: &str,
    dates: &DateArgs,
    at: BoardPath<'_>,
    output: &OutputArgs,
) -> Result<()> {
    let tables = endpoints::get_security_history(client, security, dates.start(), dates.end(), at, true)?;
    match tables.into_single() {
        Some(table) => emit(&table.normalize(&endpoints::history_normalization()), output),
        None => bail!("Unexpected multi-block history response for {security}"),
    }
}

pub(crate) fn board_history(
    client: &IssClient,
    at: BoardPath<'_>,
    date: Option<&str>,
    output: &OutputArgs,
) -> Result<()> {
    let table = client.board_history(at, date.map(DateInput::from))?;
    emit(&table.normalize(&endpoints::history_normalization()), output)
}

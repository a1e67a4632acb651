//! Display utilities and output formatting for the moexiss CLI.

use anyhow::{Context, Result};
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use moexiss_lib::prelude::*;
use std::path::Path;

use crate::OutputArgs;

/// Widest cell printed before truncation.
const MAX_CELL_WIDTH: usize = 32;

/// Output file format.
#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum Format {
    Csv,
    Json,
    Ndjson,
    Parquet,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => Self::Csv,
            Format::Json => Self::Json,
            Format::Ndjson => Self::Ndjson,
            Format::Parquet => Self::Parquet,
        }
    }
}

/// Writes a table to the requested file, or prints it to stdout.
pub(crate) fn emit(table: &Table, output: &OutputArgs) -> Result<()> {
    match &output.output {
        Some(path) => write_table(table, path, output.format),
        None => {
            print_table(table, output.limit);
            Ok(())
        }
    }
}

/// Writes a table to `path`, picking the format from the flag or extension.
pub(crate) fn write_table(table: &Table, path: &Path, format: Option<Format>) -> Result<()> {
    let format = format
        .map(OutputFormat::from)
        .or_else(|| OutputFormat::from_path(path))
        .unwrap_or_default();
    format
        .write_file(table, path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    eprintln!("Wrote {} rows to {} ({format})", table.len(), path.display());
    Ok(())
}

/// Prints up to `limit` rows as an aligned text table, index column first.
pub(crate) fn print_table(table: &Table, limit: usize) {
    let columns: Vec<_> = table.all_columns().collect();
    if columns.is_empty() {
        println!("No data.");
        return;
    }

    let shown = table.len().min(limit);
    let cells: Vec<Vec<String>> = (0..shown)
        .map(|pos| {
            columns
                .iter()
                .map(|c| c.get(pos).map(|v| truncate(&v.to_string())).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(truncate(c.name()).chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    println!("{}", render_line(columns.iter().map(|c| truncate(c.name())), &widths));
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)));
    for row in cells {
        println!("{}", render_line(row.into_iter(), &widths));
    }

    if shown < table.len() {
        println!("\nShowing {shown} of {} rows", table.len());
    } else {
        println!("\nTotal: {} rows", table.len());
    }
}

fn render_line(values: impl Iterator<Item = String>, widths: &[usize]) -> String {
    values
        .zip(widths)
        .map(|(v, &w)| format!("{v:<w$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_CELL_WIDTH {
        return text.to_string();
    }
    let mut short: String = text.chars().take(MAX_CELL_WIDTH - 1).collect();
    short.push('…');
    short
}

/// Progress bar over `len` items, hidden in quiet mode.
pub(crate) fn progress_bar(len: u64, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    pb
}

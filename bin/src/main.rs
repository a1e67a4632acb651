//! moexiss CLI - Moscow Exchange market data from the ISS REST API.

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use moexiss_lib::endpoints::{DEFAULT_INDEX, DEFAULT_STOCK_BOARD};
use moexiss_lib::prelude::*;
use std::path::PathBuf;
use std::time::Duration;

mod commands;
mod display;

use display::Format;

#[derive(Parser)]
#[command(name = "moexiss")]
#[command(about = "Moscow Exchange market data from the ISS REST API", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress progress output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Minimum interval between requests in milliseconds
    #[arg(long, global = true)]
    rate_limit_ms: Option<u64>,

    /// ISS base URL
    #[arg(long, global = true)]
    base_url: Option<String>,
}

/// Where and how to write a result table.
#[derive(Args, Clone)]
pub(crate) struct OutputArgs {
    /// Output file path. Prints a text table to stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format. Guessed from the output extension, CSV otherwise.
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Maximum rows to print to stdout
    #[arg(long, default_value = "50")]
    limit: usize,
}

/// Inclusive date range.
#[derive(Args, Clone)]
pub(crate) struct DateArgs {
    /// Start date (YYYY-MM-DD)
    #[arg(short, long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD). Defaults to today when a start date is given.
    #[arg(short, long)]
    end: Option<String>,
}

impl DateArgs {
    pub(crate) fn start(&self) -> Option<DateInput> {
        self.start.as_deref().map(DateInput::from)
    }

    pub(crate) fn end(&self) -> Option<DateInput> {
        self.end.as_deref().map(DateInput::from)
    }
}

/// Engine, market and board selection.
#[derive(Args, Clone)]
pub(crate) struct BoardArgs {
    /// Trading engine
    #[arg(long, default_value = "stock")]
    engine: String,

    /// Market
    #[arg(long, default_value = "shares")]
    market: String,

    /// Board
    #[arg(short, long, default_value = DEFAULT_STOCK_BOARD)]
    board: String,
}

impl BoardArgs {
    pub(crate) fn path(&self) -> BoardPath<'_> {
        BoardPath::new(&self.engine, &self.market, &self.board)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List trading engines
    Engines {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// List markets of an engine
    Markets {
        /// Trading engine
        #[arg(default_value = "stock")]
        engine: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List boards of a market
    Boards {
        /// Trading engine
        #[arg(default_value = "stock")]
        engine: String,

        /// Market
        #[arg(default_value = "shares")]
        market: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List securities traded on a board
    Securities {
        /// Preset board: stocks (TQBR) or bonds (TQOB)
        #[arg(long, value_enum, default_value = "stocks")]
        kind: commands::reference::SecurityKind,

        /// Board override
        #[arg(short, long)]
        board: Option<String>,

        /// Join current market data onto each security
        #[arg(long)]
        with_market_data: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Search securities by code or name
    Search {
        /// Search text
        query: String,

        /// Filter locally within one engine/market instead of remote search
        #[arg(long, requires = "market")]
        engine: Option<String>,

        /// Market for local filtering
        #[arg(long, requires = "engine")]
        market: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show security description and boards
    Info {
        /// Security code (e.g., SBER)
        security: String,

        /// Block to show (description, boards). Shows all when omitted.
        #[arg(long)]
        block: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show current market data for one security
    Quote {
        /// Security code
        security: String,

        #[command(flatten)]
        board: BoardArgs,

        /// Query the security without board selection
        #[arg(long)]
        any_board: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Fetch market data for several securities
    Snapshot {
        /// Security codes
        #[arg(required = true)]
        tickers: Vec<String>,

        #[command(flatten)]
        board: BoardArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show the order book of a security
    Orderbook {
        /// Security code
        security: String,

        #[command(flatten)]
        board: BoardArgs,

        /// Number of levels per side
        #[arg(long, default_value = "20")]
        depth: u32,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show recent trades of a security
    Trades {
        /// Security code
        security: String,

        #[command(flatten)]
        board: BoardArgs,

        /// Query all boards of the market
        #[arg(long)]
        any_board: bool,

        /// Maximum number of trades
        #[arg(long, default_value = "50")]
        limit_trades: u32,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Download candles for a security
    Candles {
        /// Security code
        security: String,

        /// Candle intervals (min, 1min, 10min, hour, day, week, month, quarter)
        #[arg(short, long, value_delimiter = ',', default_value = "day")]
        interval: Vec<String>,

        #[command(flatten)]
        dates: DateArgs,

        /// Board
        #[arg(short, long, default_value = DEFAULT_STOCK_BOARD)]
        board: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Download trading history for a security
    History {
        /// Security code
        security: String,

        #[command(flatten)]
        dates: DateArgs,

        #[command(flatten)]
        board: BoardArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Download history of every security on a board for one day
    BoardHistory {
        #[command(flatten)]
        board: BoardArgs,

        /// Trading date (YYYY-MM-DD). Latest when omitted.
        #[arg(short, long)]
        date: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List market indices
    Indices {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show the composition of an index
    Index {
        /// Index code
        #[arg(default_value = DEFAULT_INDEX)]
        index: String,

        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Installs the logger; `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Builds the client from environment config overridden by CLI flags.
fn build_client(cli: &Cli) -> Result<IssClient> {
    let mut config = ClientConfig::from_env().context("Invalid MOEXISS_* environment")?;
    if let Some(ms) = cli.rate_limit_ms {
        config = config.with_rate_limit(Duration::from_millis(ms));
    }
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url.as_str());
    }
    IssClient::new(config).context("Failed to create ISS client")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Show help if no command provided
    let Some(command) = &cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let client = build_client(&cli)?;
    let quiet = cli.quiet;

    match command {
        Commands::Engines { output } => commands::reference::engines(&client, output),
        Commands::Markets { engine, output } => {
            commands::reference::markets(&client, engine, output)
        }
        Commands::Boards {
            engine,
            market,
            output,
        } => commands::reference::boards(&client, engine, market, output),
        Commands::Securities {
            kind,
            board,
            with_market_data,
            output,
        } => commands::reference::securities(
            &client,
            *kind,
            board.as_deref(),
            *with_market_data,
            output,
            quiet,
        ),
        Commands::Search {
            query,
            engine,
            market,
            output,
        } => {
            let market = engine.as_deref().zip(market.as_deref());
            commands::reference::search(&client, query, market, output)
        }
        Commands::Info {
            security,
            block,
            output,
        } => commands::reference::info(&client, security, block.as_deref(), output),
        Commands::Quote {
            security,
            board,
            any_board,
            output,
        } => commands::market::quote(&client, security, (!any_board).then(|| board.path()), output),
        Commands::Snapshot {
            tickers,
            board,
            output,
        } => commands::market::snapshot(&client, tickers, board.path(), output, quiet),
        Commands::Orderbook {
            security,
            board,
            depth,
            output,
        } => commands::market::orderbook(&client, security, board.path(), *depth, output),
        Commands::Trades {
            security,
            board,
            any_board,
            limit_trades,
            output,
        } => commands::market::trades(
            &client,
            security,
            board,
            *any_board,
            *limit_trades,
            output,
        ),
        Commands::Candles {
            security,
            interval,
            dates,
            board,
            output,
        } => commands::history::candles(&client, security, interval, dates, board, output),
        Commands::History {
            security,
            dates,
            board,
            output,
        } => commands::history::history(&client, security, dates, board.path(), output),
        Commands::BoardHistory {
            board,
            date,
            output,
        } => commands::history::board_history(&client, board.path(), date.as_deref(), output),
        Commands::Indices { output } => commands::reference::indices(&client, output),
        Commands::Index { index, output } => commands::reference::index(&client, index, output),
    }
}

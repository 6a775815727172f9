//! Operational CLI for the fxlake pipeline: `import`,
//! `materialize`, `backfill`, `analyze`. Exits 0 on success, non-zero on a
//! fatal error — argument parsing and credential/connection failures are
//! the only things that abort the process; everything component D/E can
//! themselves absorb (bad ticks, flaky provider chunks) is handled inside
//! them and only surfaces as a summary line here.

mod commands;
mod config;
mod logging;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "fxlake", about = "FX Lake tick-to-candle pipeline operational CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pull a historical tick range from the provider into the data lake.
    Import {
        symbol: String,
        start: String,
        end: String,
        /// Width of each top-level chunk, in hours (default 24).
        chunk_hours: Option<i64>,
        /// Delay between chunks, in seconds (default 10, 0 allowed).
        delay_sec: Option<u64>,
    },
    /// Materialize tick blobs for a day or inclusive day range into candles_5m.
    Materialize {
        symbol: String,
        /// `YYYY-MM-DD` or `YYYY-MM-DD:YYYY-MM-DD`.
        range: String,
        #[arg(long)]
        dry_run: bool,
    },
    /// Import and materialize any Fridays missing from candles_5m in range.
    Backfill {
        symbol: String,
        start: String,
        end: String,
        #[arg(long)]
        dry_run: bool,
    },
    /// Walk the data lake and print per-symbol tick/candle statistics.
    Analyze {
        /// Sample only the first tick blob per symbol/day instead of every blob.
        #[arg(long)]
        sample: bool,
        #[arg(long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Import {
            symbol,
            start,
            end,
            chunk_hours,
            delay_sec,
        } => commands::import::run(&symbol, &start, &end, chunk_hours, delay_sec).await,
        Command::Materialize {
            symbol,
            range,
            dry_run,
        } => commands::materialize::run(&symbol, &range, dry_run).await,
        Command::Backfill {
            symbol,
            start,
            end,
            dry_run,
        } => commands::backfill::run(&symbol, &start, &end, dry_run).await,
        Command::Analyze { sample, output } => commands::analyze::run(sample, output).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(?error, "fxlake command failed");
            ExitCode::FAILURE
        }
    }
}

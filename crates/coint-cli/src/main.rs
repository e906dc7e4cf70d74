mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::analyze::AnalyzeArgs;
use commands::cointegration::{PairwiseArgs, RankArgs};
use commands::simulate::SimulateArgs;
use commands::spread::{SpreadArgs, ZScoreArgs};
use commands::strategy::{BacktestArgs, SignalsArgs};

/// Cointegration testing and mean-reversion backtests
#[derive(Parser)]
#[command(
    name = "coint",
    version,
    about = "Cointegration testing and mean-reversion backtests",
    long_about = "Tests baskets of price series for cointegration (Engle-Granger residual \
                  test, Johansen rank test), builds and z-scores the implied spread, and \
                  backtests a threshold mean-reversion rule on it."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log stage results to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Engle-Granger residual test on two series, in both directions
    Pairwise(PairwiseArgs),
    /// Johansen rank test on a price basket
    Rank(RankArgs),
    /// Build a spread from prices and weights
    Spread(SpreadArgs),
    /// Z-score a spread (global or rolling)
    Zscore(ZScoreArgs),
    /// Turn a z-score into long/short/flat positions
    Signals(SignalsArgs),
    /// Backtest positions over a spread
    Backtest(BacktestArgs),
    /// Rank test, spread, signals and backtest in one pass
    Analyze(AnalyzeArgs),
    /// Generate a synthetic cointegrated price basket
    Simulate(SimulateArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Pairwise(args) => commands::cointegration::run_pairwise(args),
        Commands::Rank(args) => commands::cointegration::run_rank(args),
        Commands::Spread(args) => commands::spread::run_spread(args),
        Commands::Zscore(args) => commands::spread::run_zscore(args),
        Commands::Signals(args) => commands::strategy::run_signals(args),
        Commands::Backtest(args) => commands::strategy::run_backtest_cmd(args),
        Commands::Analyze(args) => commands::analyze::run_analyze(args),
        Commands::Simulate(args) => commands::simulate::run_simulate(args),
        Commands::Version => {
            println!("coint {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

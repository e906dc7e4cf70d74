use std::time::Instant;

use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use coint_core::{generate_signals, run_backtest, Position, SignalThresholds, Spread, ZScore};

use super::envelope;
use crate::input;

/// Arguments for turning a z-score into positions
#[derive(Args)]
pub struct SignalsArgs {
    /// Path to JSON/YAML input file with `zscore` and optional `thresholds`
    #[arg(long)]
    pub input: Option<String>,

    /// Entry threshold, overriding the input document
    #[arg(long)]
    pub entry: Option<f64>,

    /// Exit threshold, overriding the input document
    #[arg(long, allow_hyphen_values = true)]
    pub exit: Option<f64>,
}

/// Arguments for backtesting positions over a spread
#[derive(Args)]
pub struct BacktestArgs {
    /// Path to JSON/YAML input file with `spread` and `positions`
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SignalsInput {
    zscore: ZScore,
    #[serde(default)]
    thresholds: SignalThresholds,
}

#[derive(Debug, Serialize)]
struct SignalsOutput {
    positions: Vec<Position>,
    long_bars: usize,
    short_bars: usize,
}

#[derive(Debug, Deserialize)]
struct BacktestInput {
    spread: Spread,
    positions: Vec<Position>,
}

pub fn run_signals(args: SignalsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut signals_input: SignalsInput = input::load(args.input.as_deref(), "signals")?;
    if let Some(entry) = args.entry {
        signals_input.thresholds.entry = entry;
    }
    if let Some(exit) = args.exit {
        signals_input.thresholds.exit = exit;
    }
    let start = Instant::now();

    let positions = generate_signals(&signals_input.zscore, &signals_input.thresholds)?;
    let count = |side: Position| positions.iter().filter(|p| **p == side).count();
    let output = SignalsOutput {
        long_bars: count(Position::Long),
        short_bars: count(Position::Short),
        positions,
    };

    envelope(
        "Threshold state machine (exit before entry)",
        &signals_input.thresholds,
        Vec::new(),
        start,
        output,
    )
}

pub fn run_backtest_cmd(args: BacktestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bt_input: BacktestInput = input::load(args.input.as_deref(), "backtest")?;
    let start = Instant::now();

    let result = run_backtest(&bt_input.spread, &bt_input.positions)?;

    let assumptions = json!({
        "execution_lag_bars": 1,
        "position_size": "unit",
        "transaction_costs": "none",
        "annualization_bars": 252,
    });
    envelope(
        "Spread-change backtest of discrete positions",
        &assumptions,
        Vec::new(),
        start,
        result,
    )
}

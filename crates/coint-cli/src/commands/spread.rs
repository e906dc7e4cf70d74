use std::time::Instant;

use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use coint_core::spread::{build_spread, describe, normalize, zscore_of, SpreadSummary, ZScoreMode};
use coint_core::{PriceSeriesStore, Spread, WeightVector, ZScore};

use super::envelope;
use crate::input;

/// Arguments for building a spread from prices and weights
#[derive(Args)]
pub struct SpreadArgs {
    /// Path to JSON/YAML input file with `prices` and `weights`
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for z-scoring a spread
#[derive(Args)]
pub struct ZScoreArgs {
    /// Path to JSON/YAML input file with `spread` and optional `zscore` mode
    #[arg(long)]
    pub input: Option<String>,

    /// Rolling window, overriding the input document
    #[arg(long, conflicts_with = "global")]
    pub window: Option<usize>,

    /// Use the whole-series mean and std, overriding the input document
    #[arg(long)]
    pub global: bool,
}

#[derive(Debug, Deserialize)]
struct SpreadInput {
    prices: PriceSeriesStore,
    weights: WeightVector,
    #[serde(default)]
    use_log_prices: bool,
    /// Rescale weights so the last instrument carries weight 1
    #[serde(default)]
    normalize: bool,
}

#[derive(Debug, Serialize)]
struct SpreadOutput {
    weights: WeightVector,
    spread: Spread,
    summary: SpreadSummary,
}

#[derive(Debug, Deserialize)]
struct ZScoreInput {
    spread: Spread,
    #[serde(default)]
    zscore: ZScoreMode,
}

#[derive(Debug, Serialize)]
struct ZScoreOutput {
    zscore: ZScore,
    defined: usize,
}

pub fn run_spread(args: SpreadArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let spread_input: SpreadInput = input::load(args.input.as_deref(), "spread")?;
    let start = Instant::now();

    let weights = if spread_input.normalize {
        normalize(&spread_input.weights)?
    } else {
        spread_input.weights.clone()
    };
    let spread = build_spread(
        spread_input.prices.columns(),
        &weights,
        spread_input.use_log_prices,
    )?;
    let summary = describe(&spread)?;

    let assumptions = json!({
        "instruments": spread_input.prices.instruments(),
        "use_log_prices": spread_input.use_log_prices,
        "normalized": spread_input.normalize,
    });
    envelope(
        "Row-wise weighted sum of prices",
        &assumptions,
        Vec::new(),
        start,
        SpreadOutput {
            weights,
            spread,
            summary,
        },
    )
}

pub fn run_zscore(args: ZScoreArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut z_input: ZScoreInput = input::load(args.input.as_deref(), "zscore")?;
    if args.global {
        z_input.zscore = ZScoreMode::Global;
    } else if let Some(window) = args.window {
        z_input.zscore = ZScoreMode::Rolling { window };
    }
    let start = Instant::now();

    let zscore = zscore_of(&z_input.spread, z_input.zscore)?;
    let defined = zscore.iter().filter(|z| z.is_some()).count();

    let mut warnings = Vec::new();
    if defined < zscore.len() {
        warnings.push(format!(
            "{} of {} z-scores are undefined (warm-up or flat windows)",
            zscore.len() - defined,
            zscore.len()
        ));
    }

    envelope(
        "Spread z-score",
        &z_input.zscore,
        warnings,
        start,
        ZScoreOutput { zscore, defined },
    )
}

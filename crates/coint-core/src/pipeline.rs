use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::backtest::{run_backtest, BacktestResult};
use crate::cointegration::{rank_test, RankResult};
use crate::prices::PriceSeriesStore;
use crate::signals::{generate_signals, SignalThresholds};
use crate::spread::{build_spread, describe, normalize, zscore_of, SpreadSummary, ZScoreMode};
use crate::stats::adf::{adf_test, AdfResult};
use crate::types::{
    with_metadata, ComputationOutput, Instrument, Position, Spread, WeightVector, ZScore,
};
use crate::CointResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for a full mean-reversion analysis of a basket of instruments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeanReversionInput {
    pub prices: PriceSeriesStore,
    /// Restrict the analysis to these instruments, in this order
    #[serde(default)]
    pub instruments: Option<Vec<Instrument>>,
    /// Lagged differences in the Johansen VECM
    #[serde(default = "default_lag_order")]
    pub lag_order: usize,
    #[serde(default)]
    pub thresholds: SignalThresholds,
    /// Z-score used for trading; the stationarity report always uses a
    /// global z-score
    #[serde(default)]
    pub zscore: ZScoreMode,
    /// Build the traded spread from log prices
    #[serde(default = "default_use_log_prices")]
    pub use_log_prices: bool,
}

fn default_lag_order() -> usize {
    1
}

fn default_use_log_prices() -> bool {
    true
}

/// Everything the analysis produced, stage by stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeanReversionOutput {
    pub instruments: Vec<Instrument>,
    pub rank: RankResult,
    /// Eigenvector of the largest eigenvalue
    pub weights: WeightVector,
    /// `weights` scaled so the last instrument carries weight 1
    pub normalized_weights: WeightVector,
    /// Raw-price spread built from `weights`
    pub spread: Spread,
    pub spread_adf: AdfResult,
    pub spread_summary: SpreadSummary,
    pub spread_zscore: ZScore,
    /// Spread actually traded, built from `normalized_weights`
    pub trading_spread: Spread,
    pub trading_zscore: ZScore,
    pub positions: Vec<Position>,
    pub backtest: BacktestResult,
}

#[derive(Serialize)]
struct Assumptions<'a> {
    instruments: &'a [Instrument],
    observations: usize,
    lag_order: usize,
    rank_significance: &'static str,
    thresholds: SignalThresholds,
    zscore: ZScoreMode,
    use_log_prices: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Rank-test the basket, take the strongest cointegrating relation as spread
/// weights, check the spread for stationarity and backtest the threshold
/// rule on it.
pub fn analyze_mean_reversion(
    input: &MeanReversionInput,
) -> CointResult<ComputationOutput<MeanReversionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.thresholds.validate()?;
    let prices = match &input.instruments {
        Some(selection) => input.prices.select(selection)?,
        None => input.prices.clone(),
    };
    let columns = prices.columns();

    let rank = rank_test(columns, input.lag_order)?;
    let weights = rank.leading_weights().to_vec();
    let normalized_weights = normalize(&weights)?;
    tracing::info!(
        selected_rank = rank.selected_rank,
        weights = ?normalized_weights,
        "cointegrating weights"
    );

    // Stationarity report on the raw-price spread
    let spread = build_spread(columns, &weights, false)?;
    let spread_adf = adf_test(&spread)?;
    let spread_summary = describe(&spread)?;
    let spread_zscore = zscore_of(&spread, ZScoreMode::Global)?;
    if !spread_adf.rejects_unit_root(0.05) {
        tracing::warn!(p_value = spread_adf.p_value, "spread is not stationary");
        warnings.push(format!(
            "ADF does not reject a unit root in the spread (p = {:.4}); mean reversion is not supported",
            spread_adf.p_value
        ));
    }

    // Backtest on the normalized spread
    let trading_spread = build_spread(columns, &normalized_weights, input.use_log_prices)?;
    let trading_zscore = zscore_of(&trading_spread, input.zscore)?;
    let positions = generate_signals(&trading_zscore, &input.thresholds)?;
    let backtest = run_backtest(&trading_spread, &positions)?;
    if !input.use_log_prices {
        warnings.push(
            "Backtest spread is in raw-price space; returns are price differences, not percentages"
                .into(),
        );
    }
    if backtest.summary.trades == 0 {
        warnings.push("No position was opened over the backtest".into());
    }

    let assumptions = Assumptions {
        instruments: prices.instruments(),
        observations: prices.len(),
        lag_order: input.lag_order,
        rank_significance: "trace statistic above 95% critical value",
        thresholds: input.thresholds,
        zscore: input.zscore,
        use_log_prices: input.use_log_prices,
    };

    let output = MeanReversionOutput {
        instruments: prices.instruments().to_vec(),
        rank,
        weights,
        normalized_weights,
        spread,
        spread_adf,
        spread_summary,
        spread_zscore,
        trading_spread,
        trading_zscore,
        positions,
        backtest,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Johansen trace test, leading-eigenvector spread, z-score threshold backtest",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

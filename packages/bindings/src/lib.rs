use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use coint_core::{
    MeanReversionInput, Position, PriceSeriesStore, SignalThresholds, Spread, WeightVector, ZScore,
};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse<T: DeserializeOwned>(input_json: &str) -> NapiResult<T> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

fn render(output: &impl Serialize) -> NapiResult<String> {
    serde_json::to_string(output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct PairwiseInput {
    series_a: Vec<f64>,
    series_b: Vec<f64>,
}

#[derive(Deserialize)]
struct RankInput {
    prices: PriceSeriesStore,
    #[serde(default = "default_lag_order")]
    lag_order: usize,
}

fn default_lag_order() -> usize {
    1
}

#[derive(Deserialize)]
struct SpreadInput {
    prices: PriceSeriesStore,
    weights: WeightVector,
    #[serde(default)]
    use_log_prices: bool,
}

#[derive(Deserialize)]
struct SignalsInput {
    zscore: ZScore,
    #[serde(default)]
    thresholds: SignalThresholds,
}

#[derive(Deserialize)]
struct BacktestInput {
    spread: Spread,
    positions: Vec<Position>,
}

// ---------------------------------------------------------------------------
// Cointegration
// ---------------------------------------------------------------------------

#[napi]
pub fn pairwise_test(input_json: String) -> NapiResult<String> {
    let input: PairwiseInput = parse(&input_json)?;
    let output =
        coint_core::pairwise_test(&input.series_a, &input.series_b).map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn rank_test(input_json: String) -> NapiResult<String> {
    let input: RankInput = parse(&input_json)?;
    let output =
        coint_core::rank_test(input.prices.columns(), input.lag_order).map_err(to_napi_error)?;
    render(&output)
}

// ---------------------------------------------------------------------------
// Spread, signals, backtest
// ---------------------------------------------------------------------------

#[napi]
pub fn build_spread(input_json: String) -> NapiResult<String> {
    let input: SpreadInput = parse(&input_json)?;
    let output =
        coint_core::build_spread(input.prices.columns(), &input.weights, input.use_log_prices)
            .map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn generate_signals(input_json: String) -> NapiResult<String> {
    let input: SignalsInput = parse(&input_json)?;
    let output =
        coint_core::generate_signals(&input.zscore, &input.thresholds).map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn run_backtest(input_json: String) -> NapiResult<String> {
    let input: BacktestInput = parse(&input_json)?;
    let output =
        coint_core::run_backtest(&input.spread, &input.positions).map_err(to_napi_error)?;
    render(&output)
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_mean_reversion(input_json: String) -> NapiResult<String> {
    let input: MeanReversionInput = parse(&input_json)?;
    let output = coint_core::analyze_mean_reversion(&input).map_err(to_napi_error)?;
    render(&output)
}

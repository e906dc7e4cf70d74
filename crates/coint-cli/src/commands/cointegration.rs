use std::time::Instant;

use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use coint_core::cointegration::{pairwise_test, rank_test, PairwiseResult};
use coint_core::PriceSeriesStore;

use super::envelope;
use crate::input;

/// Arguments for the pairwise residual cointegration test
#[derive(Args)]
pub struct PairwiseArgs {
    /// Path to JSON/YAML input file with `series_a` and `series_b`
    #[arg(long)]
    pub input: Option<String>,

    /// Price CSV (`date,TICKER,...`) instead of an input document
    #[arg(long, conflicts_with = "input")]
    pub prices: Option<String>,

    /// First instrument in the CSV (defaults to the first column)
    #[arg(long, requires = "prices")]
    pub a: Option<String>,

    /// Second instrument in the CSV (defaults to the second column)
    #[arg(long, requires = "prices")]
    pub b: Option<String>,
}

/// Arguments for the Johansen rank test
#[derive(Args)]
pub struct RankArgs {
    /// Path to JSON/YAML input file with `prices` and optional `lag_order`
    #[arg(long)]
    pub input: Option<String>,

    /// Price CSV (`date,TICKER,...`) instead of an input document
    #[arg(long, conflicts_with = "input")]
    pub prices: Option<String>,

    /// Lagged differences in the VECM (CSV input only)
    #[arg(long, default_value = "1")]
    pub lag_order: usize,

    /// Comma-separated subset of CSV columns to test
    #[arg(long, value_delimiter = ',', requires = "prices")]
    pub instruments: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize)]
struct PairwiseInput {
    #[serde(default = "default_name_a")]
    name_a: String,
    #[serde(default = "default_name_b")]
    name_b: String,
    series_a: Vec<f64>,
    series_b: Vec<f64>,
}

fn default_name_a() -> String {
    "A".into()
}

fn default_name_b() -> String {
    "B".into()
}

#[derive(Debug, Serialize)]
struct PairwiseOutput {
    a: String,
    b: String,
    /// B regressed on A
    b_on_a: PairwiseResult,
    /// A regressed on B
    a_on_b: PairwiseResult,
}

#[derive(Debug, Deserialize)]
struct RankInput {
    prices: PriceSeriesStore,
    #[serde(default = "default_lag_order")]
    lag_order: usize,
}

fn default_lag_order() -> usize {
    1
}

pub fn run_pairwise(args: PairwiseArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let pair: PairwiseInput = match args.prices {
        Some(ref path) => pair_from_csv(path, args.a.as_deref(), args.b.as_deref())?,
        None => input::load(args.input.as_deref(), "pairwise")?,
    };
    let start = Instant::now();

    let b_on_a = pairwise_test(&pair.series_a, &pair.series_b)?;
    let a_on_b = pairwise_test(&pair.series_b, &pair.series_a)?;

    let mut warnings = Vec::new();
    if b_on_a.is_stationary != a_on_b.is_stationary {
        warnings.push(format!(
            "Directions disagree: {} on {} is {}stationary, {} on {} is {}stationary",
            pair.name_b,
            pair.name_a,
            if b_on_a.is_stationary { "" } else { "not " },
            pair.name_a,
            pair.name_b,
            if a_on_b.is_stationary { "" } else { "not " },
        ));
    }

    let assumptions = json!({
        "observations": pair.series_a.len(),
        "regression": "OLS with intercept",
        "unit_root_test": "ADF, constant, AIC lag selection",
        "significance": coint_core::cointegration::pairwise::SIGNIFICANCE,
    });
    envelope(
        "Engle-Granger two-step residual test",
        &assumptions,
        warnings,
        start,
        PairwiseOutput {
            a: pair.name_a,
            b: pair.name_b,
            b_on_a,
            a_on_b,
        },
    )
}

pub fn run_rank(args: RankArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rank_input: RankInput = match args.prices {
        Some(ref path) => {
            let mut prices = input::prices::read_price_csv(path)?;
            if let Some(ref names) = args.instruments {
                prices = prices.select(names)?;
            }
            RankInput {
                prices,
                lag_order: args.lag_order,
            }
        }
        None => input::load(args.input.as_deref(), "rank")?,
    };
    let start = Instant::now();

    let result = rank_test(rank_input.prices.columns(), rank_input.lag_order)?;

    let assumptions = json!({
        "instruments": rank_input.prices.instruments(),
        "observations": rank_input.prices.len(),
        "lag_order": rank_input.lag_order,
        "deterministic_terms": "constant (det_order = 0)",
        "selection": "highest rank whose trace statistic exceeds the 95% critical value",
    });
    envelope(
        "Johansen trace and max-eigenvalue test",
        &assumptions,
        Vec::new(),
        start,
        result,
    )
}

fn pair_from_csv(
    path: &str,
    a: Option<&str>,
    b: Option<&str>,
) -> Result<PairwiseInput, Box<dyn std::error::Error>> {
    let prices = input::prices::read_price_csv(path)?;
    let names = prices.instruments();
    let pick = |wanted: Option<&str>, fallback: usize| -> Result<String, String> {
        match wanted {
            Some(name) => Ok(name.to_string()),
            None => names
                .get(fallback)
                .cloned()
                .ok_or_else(|| format!("Price CSV needs at least {} instruments", fallback + 1)),
        }
    };
    let name_a = pick(a, 0)?;
    let name_b = pick(b, 1)?;
    let column = |name: &str| -> Result<Vec<f64>, String> {
        prices
            .column(name)
            .map(<[f64]>::to_vec)
            .ok_or_else(|| format!("Unknown instrument '{name}'"))
    };
    Ok(PairwiseInput {
        series_a: column(&name_a)?,
        series_b: column(&name_b)?,
        name_a,
        name_b,
    })
}

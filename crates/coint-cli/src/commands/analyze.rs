use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use coint_core::{
    analyze_mean_reversion, InMemoryProvider, MeanReversionInput, PriceProvider,
    PriceSeriesStore, SignalThresholds, ZScoreMode,
};

use crate::input;

/// Arguments for the end-to-end mean-reversion analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to JSON/YAML input file (MeanReversionInput)
    #[arg(long)]
    pub input: Option<String>,

    /// Price CSV (`date,TICKER,...`) instead of an input document
    #[arg(long, conflicts_with = "input")]
    pub prices: Option<String>,

    /// Comma-separated subset of CSV columns to analyze
    #[arg(long, value_delimiter = ',', requires = "prices")]
    pub instruments: Option<Vec<String>>,

    /// First date to include (YYYY-MM-DD, CSV input only)
    #[arg(long, requires = "prices")]
    pub start: Option<NaiveDate>,

    /// Last date to include (YYYY-MM-DD, CSV input only)
    #[arg(long, requires = "prices")]
    pub end: Option<NaiveDate>,

    /// Lagged differences in the Johansen VECM
    #[arg(long, default_value = "1")]
    pub lag_order: usize,

    /// Entry threshold in standard deviations
    #[arg(long, default_value = "0.5")]
    pub entry: f64,

    /// Exit threshold in standard deviations
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    pub exit: f64,

    /// Rolling z-score window
    #[arg(long, default_value = "5")]
    pub window: usize,

    /// Trade the spread in price space instead of log-price space
    #[arg(long)]
    pub raw_prices: bool,
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let analysis_input: MeanReversionInput = match args.prices {
        Some(ref path) => MeanReversionInput {
            prices: fetch_csv(path, &args)?,
            instruments: None,
            lag_order: args.lag_order,
            thresholds: SignalThresholds::new(args.entry, args.exit)?,
            zscore: ZScoreMode::Rolling {
                window: args.window,
            },
            use_log_prices: !args.raw_prices,
        },
        None => input::load(args.input.as_deref(), "analyze")?,
    };
    let result = analyze_mean_reversion(&analysis_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Serve the CSV through an in-memory provider, narrowed to the requested
/// instruments and date range.
fn fetch_csv(
    path: &str,
    args: &AnalyzeArgs,
) -> Result<PriceSeriesStore, Box<dyn std::error::Error>> {
    let store = input::prices::read_price_csv(path)?;
    let (first, last) = match (store.dates().first(), store.dates().last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(format!("No aligned observations in '{path}'").into()),
    };
    let instruments = args
        .instruments
        .clone()
        .unwrap_or_else(|| store.instruments().to_vec());
    let provider = InMemoryProvider::new(store);
    Ok(provider.fetch(
        &instruments,
        args.start.unwrap_or(first),
        args.end.unwrap_or(last),
    )?)
}

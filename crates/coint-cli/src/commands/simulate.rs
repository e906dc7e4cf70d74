use clap::Args;
use serde_json::Value;

use coint_core::prices::PriceTable;
use coint_core::synthetic::{generate_cointegrated, SyntheticInput};
use coint_core::PriceSeriesStore;

use crate::input;

/// Arguments for generating a synthetic cointegrated basket
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON/YAML generator settings; defaults apply otherwise
    #[arg(long)]
    pub input: Option<String>,

    /// Number of observations, overriding the settings
    #[arg(long)]
    pub n_obs: Option<usize>,

    /// RNG seed, overriding the settings
    #[arg(long)]
    pub seed: Option<u64>,

    /// Also write the prices as a `date,TICKER,...` CSV to this path
    #[arg(long)]
    pub write_csv: Option<String>,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut settings: SyntheticInput = match args.input {
        Some(ref path) => input::file::read_document(path)?,
        None => SyntheticInput::default(),
    };
    if let Some(n_obs) = args.n_obs {
        settings.n_obs = n_obs;
    }
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }

    let store = generate_cointegrated(&settings)?;
    if let Some(ref path) = args.write_csv {
        write_price_csv(path, &store)?;
        tracing::info!(path = %path, rows = store.len(), "wrote synthetic prices");
    }
    Ok(serde_json::to_value(PriceTable::from(store))?)
}

fn write_price_csv(path: &str, store: &PriceSeriesStore) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|e| format!("Failed to create '{}': {}", path, e))?;

    let header: Vec<&str> = std::iter::once("date")
        .chain(store.instruments().iter().map(String::as_str))
        .collect();
    wtr.write_record(&header)?;

    for (t, date) in store.dates().iter().enumerate() {
        let prices = store
            .row(t)
            .ok_or_else(|| format!("Row {t} is missing from the synthetic prices"))?;
        let row: Vec<String> = std::iter::once(date.format("%Y-%m-%d").to_string())
            .chain(prices.iter().map(f64::to_string))
            .collect();
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

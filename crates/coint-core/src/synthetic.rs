//! Seeded generator of cointegrated price baskets.
//!
//! Every instrument loads on one common random-walk trend and adds its own
//! i.i.d. normal noise, so any weight vector orthogonal to the loadings gives
//! a stationary spread.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;

use crate::error::CointError;
use crate::prices::PriceSeriesStore;
use crate::types::Instrument;
use crate::CointResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticInput {
    #[serde(default = "default_instruments")]
    pub instruments: Vec<Instrument>,
    /// Trend loading per instrument
    #[serde(default = "default_loadings")]
    pub loadings: Vec<f64>,
    #[serde(default = "default_n_obs")]
    pub n_obs: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Starting level of the common trend
    #[serde(default = "default_base_price")]
    pub base_price: f64,
    /// Std of the trend's daily increments
    #[serde(default = "default_trend_volatility")]
    pub trend_volatility: f64,
    /// Std of each instrument's idiosyncratic noise
    #[serde(default = "default_noise_std")]
    pub noise_std: f64,
    /// First business day of the calendar
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
}

fn default_instruments() -> Vec<Instrument> {
    vec!["A".into(), "B".into()]
}
fn default_loadings() -> Vec<f64> {
    vec![1.0, 2.0]
}
fn default_n_obs() -> usize {
    500
}
fn default_seed() -> u64 {
    42
}
fn default_base_price() -> f64 {
    100.0
}
fn default_trend_volatility() -> f64 {
    1.0
}
fn default_noise_std() -> f64 {
    0.5
}
fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}

impl Default for SyntheticInput {
    fn default() -> Self {
        Self {
            instruments: default_instruments(),
            loadings: default_loadings(),
            n_obs: default_n_obs(),
            seed: default_seed(),
            base_price: default_base_price(),
            trend_volatility: default_trend_volatility(),
            noise_std: default_noise_std(),
            start_date: default_start_date(),
        }
    }
}

/// Generate a cointegrated basket on a weekday calendar.
pub fn generate_cointegrated(input: &SyntheticInput) -> CointResult<PriceSeriesStore> {
    validate(input)?;

    let mut rng = StdRng::seed_from_u64(input.seed);
    let step = normal(input.trend_volatility, "trend_volatility")?;
    let noise = normal(input.noise_std, "noise_std")?;

    let mut level = input.base_price;
    let trend: Vec<f64> = (0..input.n_obs)
        .map(|_| {
            level += step.sample(&mut rng);
            level
        })
        .collect();

    let columns: Vec<Vec<f64>> = input
        .loadings
        .iter()
        .map(|loading| {
            trend
                .iter()
                .map(|t| loading * t + noise.sample(&mut rng))
                .collect()
        })
        .collect();

    if let Some(min) = columns.iter().flatten().copied().reduce(f64::min) {
        if min <= 0.0 {
            return Err(CointError::InvalidInput {
                field: "base_price".into(),
                reason: format!(
                    "Generated path reached a non-positive price ({min:.4}); raise base_price or lower trend_volatility"
                ),
            });
        }
    }

    tracing::debug!(
        instruments = input.instruments.len(),
        n_obs = input.n_obs,
        seed = input.seed,
        "generated synthetic basket"
    );

    PriceSeriesStore::new(
        input.instruments.clone(),
        business_days(input.start_date, input.n_obs)?,
        columns,
    )
}

fn validate(input: &SyntheticInput) -> CointResult<()> {
    if input.instruments.len() != input.loadings.len() {
        return Err(CointError::DimensionMismatch {
            context: "synthetic loadings vs instruments".into(),
            expected: input.instruments.len(),
            actual: input.loadings.len(),
        });
    }
    if input.n_obs == 0 {
        return Err(CointError::InvalidInput {
            field: "n_obs".into(),
            reason: "Must be positive".into(),
        });
    }
    if !input.base_price.is_finite() || input.base_price <= 0.0 {
        return Err(CointError::InvalidInput {
            field: "base_price".into(),
            reason: format!("Must be finite and positive, got {}", input.base_price),
        });
    }
    Ok(())
}

fn normal(std_dev: f64, field: &str) -> CointResult<Normal> {
    if !std_dev.is_finite() || std_dev <= 0.0 {
        return Err(CointError::InvalidInput {
            field: field.into(),
            reason: format!("Must be finite and positive, got {std_dev}"),
        });
    }
    Normal::new(0.0, std_dev).map_err(|_| CointError::InvalidInput {
        field: field.into(),
        reason: format!("Invalid normal distribution std {std_dev}"),
    })
}

fn business_days(start: NaiveDate, n: usize) -> CointResult<Vec<NaiveDate>> {
    let mut dates = Vec::with_capacity(n);
    let mut day = start;
    while dates.len() < n {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(day);
        }
        day = day.succ_opt().ok_or_else(|| CointError::InvalidInput {
            field: "start_date".into(),
            reason: "Calendar runs past the last representable date".into(),
        })?;
    }
    Ok(dates)
}

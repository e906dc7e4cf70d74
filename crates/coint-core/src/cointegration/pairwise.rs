use serde::{Deserialize, Serialize};

use crate::error::CointError;
use crate::stats::adf::{self, CriticalValues, MIN_OBSERVATIONS};
use crate::stats::descriptive::sample_variance;
use crate::stats::ols;
use crate::CointResult;

/// Significance level below which the residual is classed as stationary.
pub const SIGNIFICANCE: f64 = 0.05;

/// Outcome of the two-step residual cointegration test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairwiseResult {
    /// OLS intercept (alpha) of B on A
    pub intercept: f64,
    /// OLS slope (beta) of B on A
    pub hedge_ratio: f64,
    /// ADF statistic of the regression residual
    pub statistic: f64,
    pub p_value: f64,
    pub used_lag: usize,
    pub n_obs: usize,
    pub critical_values: CriticalValues,
    /// `p_value < 0.05`
    pub is_stationary: bool,
    /// Mean-reversion half-life of the residual in bars, when it reverts
    pub half_life: Option<f64>,
}

/// Regress `series_b` on `series_a` with a constant and test the residual for
/// a unit root.
///
/// The test is not symmetric: swapping the inputs changes the regression and
/// therefore the residual being tested.
pub fn pairwise_test(series_a: &[f64], series_b: &[f64]) -> CointResult<PairwiseResult> {
    let n = series_a.len();
    if series_b.len() != n {
        return Err(CointError::LengthMismatch {
            context: "pairwise test series".into(),
            left: n,
            right: series_b.len(),
        });
    }
    if n < MIN_OBSERVATIONS {
        return Err(CointError::InsufficientData(format!(
            "Pairwise test needs at least {} observations per series, got {}",
            MIN_OBSERVATIONS, n
        )));
    }
    if sample_variance(series_a) == 0.0 {
        return Err(CointError::SingularMatrix {
            context: "pairwise regression — series A has zero variance".into(),
        });
    }

    let (intercept, hedge_ratio, fit) =
        ols::fit_line(series_b, series_a, "pairwise regression")?;
    let adf = adf::adf_test(&fit.residuals)?;
    let is_stationary = adf.p_value < SIGNIFICANCE;
    let half_life = half_life(&fit.residuals);

    tracing::debug!(
        hedge_ratio,
        statistic = adf.statistic,
        p_value = adf.p_value,
        is_stationary,
        "pairwise cointegration test"
    );

    Ok(PairwiseResult {
        intercept,
        hedge_ratio,
        statistic: adf.statistic,
        p_value: adf.p_value,
        used_lag: adf.used_lag,
        n_obs: adf.n_obs,
        critical_values: adf.critical_values,
        is_stationary,
        half_life,
    })
}

/// Half-life from the AR(1) fit `ds_t = c + phi * s_{t-1}`:
/// `-ln(2) / ln(1 + phi)` for `-1 < phi < 0`. `phi <= -1` reverts within a
/// single step and reports zero; `phi >= 0` never reverts.
pub fn half_life(spread: &[f64]) -> Option<f64> {
    if spread.len() < 3 {
        return None;
    }
    let lagged = &spread[..spread.len() - 1];
    let delta: Vec<f64> = spread.windows(2).map(|w| w[1] - w[0]).collect();
    let (_, phi, _) = ols::fit_line(&delta, lagged, "half-life regression").ok()?;

    if phi >= 0.0 {
        return None;
    }
    if phi <= -1.0 {
        return Some(0.0);
    }
    let hl = -std::f64::consts::LN_2 / (1.0 + phi).ln();
    hl.is_finite().then_some(hl)
}

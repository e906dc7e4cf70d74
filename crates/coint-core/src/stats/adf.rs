//! Augmented Dickey-Fuller unit-root test with a constant term.
//!
//! Lag length is chosen by AIC over `0..=maxlag` on a common sample, then the
//! chosen specification is refitted on the longest sample it allows.
//! p-values use MacKinnon's (1994) normal-CDF approximation and critical
//! values MacKinnon's (2010) response surfaces, both for the single-series,
//! constant-only case.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;

use crate::error::CointError;
use crate::stats::descriptive::sample_variance;
use crate::stats::ols::{self, OlsFit};
use crate::CointResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// ADF critical values at the conventional significance levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalValues {
    pub one_pct: f64,
    pub five_pct: f64,
    pub ten_pct: f64,
}

/// Outcome of an augmented Dickey-Fuller test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdfResult {
    /// t-statistic of the lagged level; more negative = stronger rejection
    pub statistic: f64,
    pub p_value: f64,
    /// Number of lagged differences in the final regression
    pub used_lag: usize,
    /// Observations in the final regression
    pub n_obs: usize,
    pub critical_values: CriticalValues,
    /// AIC of the selected lag on the common autolag sample
    pub ic_best: f64,
}

impl AdfResult {
    /// Unit root rejected at the given significance level.
    pub fn rejects_unit_root(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Shortest series accepted by the test.
pub const MIN_OBSERVATIONS: usize = 20;

const TAU_MAX: f64 = 2.74;
const TAU_MIN: f64 = -18.86;
const TAU_STAR: f64 = -1.61;
const TAU_SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

/// Response-surface coefficients (constant, 1/T, 1/T^2, 1/T^3) for 1%, 5%, 10%.
const TAU_C_2010: [[f64; 4]; 3] = [
    [-3.43035, -6.5393, -16.786, -79.433],
    [-2.86154, -2.8903, -4.234, -40.040],
    [-2.56677, -1.5384, -2.809, 0.0],
];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the ADF test on `series`.
pub fn adf_test(series: &[f64]) -> CointResult<AdfResult> {
    let n = series.len();
    if n < MIN_OBSERVATIONS {
        return Err(CointError::InsufficientData(format!(
            "ADF test needs at least {} observations, got {}",
            MIN_OBSERVATIONS, n
        )));
    }
    if series.iter().any(|v| !v.is_finite()) {
        return Err(CointError::InvalidInput {
            field: "series".into(),
            reason: "ADF input contains non-finite values".into(),
        });
    }
    if sample_variance(series) == 0.0 {
        return Err(CointError::DivisionByZero {
            context: "ADF test — series is constant".into(),
        });
    }

    let maxlag = default_maxlag(n);
    let diff: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();

    // Lag selection on the sample trimmed by maxlag
    let mut best: Option<(f64, usize)> = None;
    for lag in 0..=maxlag {
        let (x, y) = design(series, &diff, lag, maxlag);
        let aic = match ols::fit(&x, &y, "ADF lag selection") {
            Ok(fit) => fit.aic(),
            Err(e) => {
                tracing::debug!(lag, error = %e, "skipping ADF lag candidate");
                continue;
            }
        };
        if !aic.is_finite() {
            continue;
        }
        if best.map_or(true, |(ic, _)| aic < ic) {
            best = Some((aic, lag));
        }
    }
    let (ic_best, used_lag) = best.ok_or_else(|| CointError::SingularMatrix {
        context: "ADF lag selection — no lag length could be fitted".into(),
    })?;

    // Refit with the chosen lag on the longest sample it allows
    let (x, y) = design(series, &diff, used_lag, used_lag);
    let fit: OlsFit = ols::fit(&x, &y, "ADF regression")?;
    if fit.std_errors[0] == 0.0 || !fit.std_errors[0].is_finite() {
        return Err(CointError::DivisionByZero {
            context: "ADF regression — zero standard error on lagged level".into(),
        });
    }

    let statistic = fit.t_value(0);
    let n_obs = fit.n_obs;
    let p_value = mackinnon_p_value(statistic);

    tracing::debug!(statistic, p_value, used_lag, n_obs, "ADF test");

    Ok(AdfResult {
        statistic,
        p_value,
        used_lag,
        n_obs,
        critical_values: mackinnon_critical_values(n_obs),
        ic_best,
    })
}

/// Approximate p-value of an ADF statistic (constant, one series).
pub fn mackinnon_p_value(statistic: f64) -> f64 {
    if statistic > TAU_MAX {
        return 1.0;
    }
    if statistic < TAU_MIN {
        return 0.0;
    }
    let z = if statistic <= TAU_STAR {
        polyval(&TAU_SMALL_P, statistic)
    } else {
        polyval(&TAU_LARGE_P, statistic)
    };
    standard_normal_cdf(z)
}

/// Finite-sample critical values for `n_obs` regression observations.
pub fn mackinnon_critical_values(n_obs: usize) -> CriticalValues {
    let t = n_obs as f64;
    let cv = |c: &[f64; 4]| c[0] + c[1] / t + c[2] / t.powi(2) + c[3] / t.powi(3);
    CriticalValues {
        one_pct: cv(&TAU_C_2010[0]),
        five_pct: cv(&TAU_C_2010[1]),
        ten_pct: cv(&TAU_C_2010[2]),
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Schwert's rule, capped so the regression keeps enough degrees of freedom.
fn default_maxlag(n: usize) -> usize {
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
    schwert.min(n / 2 - 2)
}

/// Regression of `diff[t]` on `[level[t], diff[t-1..=t-lags], 1]` for
/// `t` in `start..diff.len()`.
fn design(level: &[f64], diff: &[f64], lags: usize, start: usize) -> (DMatrix<f64>, DVector<f64>) {
    let rows = diff.len() - start;
    let cols = lags + 2;
    let x = DMatrix::from_fn(rows, cols, |r, c| {
        let t = start + r;
        match c {
            0 => level[t],
            c if c <= lags => diff[t - c],
            _ => 1.0,
        }
    });
    let y = DVector::from_iterator(rows, diff[start..].iter().copied());
    (x, y)
}

/// Evaluate `c[0] + c[1] x + c[2] x^2 + ...`.
fn polyval(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

fn standard_normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

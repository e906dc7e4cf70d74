//! Johansen trace and max-eigenvalue procedure (det_order = 0).
//!
//! Levels, differences and lagged differences are demeaned; the reduced-rank
//! eigenproblem `Skk^-1 Sk0 S00^-1 S0k` is solved through the Cholesky factor
//! of `Skk`, so the returned eigenvectors satisfy `V' Skk V = I`.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use super::critical_values::{self, CriticalLevels, MAX_EQUATIONS};
use crate::error::CointError;
use crate::CointResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Raw Johansen statistics, one entry per rank hypothesis `r = 0..neqs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JohansenResult {
    pub lag_order: usize,
    /// Effective observations after differencing and lagging
    pub n_obs: usize,
    /// Descending
    pub eigenvalues: Vec<f64>,
    /// `eigenvectors[r]` pairs with `eigenvalues[r]`, one weight per instrument
    pub eigenvectors: Vec<Vec<f64>>,
    pub trace_statistics: Vec<f64>,
    pub trace_critical_values: Vec<CriticalLevels>,
    pub max_eigen_statistics: Vec<f64>,
    pub max_eigen_critical_values: Vec<CriticalLevels>,
}

/// Johansen statistics plus the rank selected from the trace test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankResult {
    #[serde(flatten)]
    pub johansen: JohansenResult,
    /// Trace statistic above its 95% critical value, per rank hypothesis
    pub rank_passes: Vec<bool>,
    /// Highest hypothesis index whose trace statistic passed
    pub highest_passing: usize,
    /// Number of cointegrating relations: `highest_passing + 1`
    pub selected_rank: usize,
}

impl RankResult {
    /// Weights of the strongest cointegrating relation.
    pub fn leading_weights(&self) -> &[f64] {
        &self.johansen.eigenvectors[0]
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Johansen rank test over `columns` (one price column per instrument).
///
/// Every rank hypothesis is evaluated; the highest index whose trace
/// statistic exceeds the 95% critical value is selected, whether or not lower
/// ranks passed. No passing rank is an error.
pub fn rank_test(columns: &[Vec<f64>], lag_order: usize) -> CointResult<RankResult> {
    let johansen = johansen(columns, lag_order)?;

    let rank_passes: Vec<bool> = johansen
        .trace_statistics
        .iter()
        .zip(&johansen.trace_critical_values)
        .map(|(stat, cv)| *stat > cv.p95)
        .collect();

    for (rank, passed) in rank_passes.iter().enumerate() {
        tracing::info!(
            rank,
            trace = johansen.trace_statistics[rank],
            critical_95 = johansen.trace_critical_values[rank].p95,
            cointegrated = *passed,
            "Johansen trace test"
        );
    }

    let highest_passing = select_rank(&rank_passes)?;

    Ok(RankResult {
        johansen,
        rank_passes,
        highest_passing,
        selected_rank: highest_passing + 1,
    })
}

/// Highest passing hypothesis index; a failure below it does not stop the scan.
fn select_rank(passes: &[bool]) -> CointResult<usize> {
    passes
        .iter()
        .rposition(|p| *p)
        .ok_or(CointError::NoCointegration {
            ranks_tested: passes.len(),
        })
}

/// Compute the Johansen eigen decomposition and statistics without selecting
/// a rank.
pub fn johansen(columns: &[Vec<f64>], lag_order: usize) -> CointResult<JohansenResult> {
    let neqs = columns.len();
    if neqs < 2 {
        return Err(CointError::InvalidInput {
            field: "prices".into(),
            reason: format!("Johansen test needs at least 2 instruments, got {neqs}"),
        });
    }
    if neqs > MAX_EQUATIONS {
        return Err(CointError::InvalidInput {
            field: "prices".into(),
            reason: format!(
                "Critical values are tabulated for at most {MAX_EQUATIONS} instruments, got {neqs}"
            ),
        });
    }
    let nobs = columns[0].len();
    for (j, column) in columns.iter().enumerate() {
        if column.len() != nobs {
            return Err(CointError::LengthMismatch {
                context: format!("Johansen input column {j} vs column 0"),
                left: column.len(),
                right: nobs,
            });
        }
        if column.iter().any(|v| !v.is_finite()) {
            return Err(CointError::InvalidInput {
                field: format!("prices[{j}]"),
                reason: "Contains non-finite values".into(),
            });
        }
    }
    let too_large = || {
        CointError::InsufficientData(format!(
            "Johansen lag order {lag_order} is too large for {nobs} rows"
        ))
    };
    let lags_plus_one = lag_order.checked_add(1).ok_or_else(too_large)?;
    let required = neqs.checked_mul(lags_plus_one).ok_or_else(too_large)?;
    let t_eff = nobs.saturating_sub(lags_plus_one);
    if t_eff <= required {
        return Err(CointError::InsufficientData(format!(
            "Johansen test with {neqs} instruments and lag order {lag_order} needs more than \
             {required} effective observations, got {t_eff} from {nobs} rows"
        )));
    }

    let endog = demean(&DMatrix::from_fn(nobs, neqs, |t, j| columns[j][t]));
    let dx = DMatrix::from_fn(nobs - 1, neqs, |t, j| endog[(t + 1, j)] - endog[(t, j)]);

    // Lagged differences: row r is time lag_order + r, column block L holds dx[t - L]
    let z = demean(&DMatrix::from_fn(t_eff, neqs * lag_order, |r, c| {
        let lag = c / neqs + 1;
        dx[(r + lag_order - lag, c % neqs)]
    }));
    let dy = demean(&dx.rows(lag_order, t_eff).into_owned());
    let levels = demean(&endog.rows(1, t_eff).into_owned());

    let r0t = residualize(&dy, &z)?;
    let rkt = residualize(&levels, &z)?;

    let tf = t_eff as f64;
    let skk = rkt.transpose() * &rkt / tf;
    let sk0 = rkt.transpose() * &r0t / tf;
    let s00 = r0t.transpose() * &r0t / tf;

    let s00_inv = s00.try_inverse().ok_or_else(|| CointError::SingularMatrix {
        context: "Johansen S00 (residual covariance of differences)".into(),
    })?;
    let sig = &sk0 * s00_inv * sk0.transpose();

    let l = skk
        .cholesky()
        .ok_or_else(|| CointError::SingularMatrix {
            context: "Johansen Skk (residual covariance of levels)".into(),
        })?
        .l();
    let l_inv = l.try_inverse().ok_or_else(|| CointError::SingularMatrix {
        context: "Johansen Cholesky factor".into(),
    })?;

    let m = &l_inv * sig * l_inv.transpose();
    let m = (&m + m.transpose()) * 0.5;
    let eig = m.symmetric_eigen();
    let vectors = l_inv.transpose() * &eig.eigenvectors;

    let mut order: Vec<usize> = (0..neqs).collect();
    order.sort_by(|&a, &b| eig.eigenvalues[b].total_cmp(&eig.eigenvalues[a]));

    let mut eigenvalues = Vec::with_capacity(neqs);
    let mut eigenvectors = Vec::with_capacity(neqs);
    for &i in &order {
        let lambda = eig.eigenvalues[i].max(0.0);
        if lambda >= 1.0 {
            return Err(CointError::SingularMatrix {
                context: format!("Johansen eigenvalue {lambda} is not below 1"),
            });
        }
        eigenvalues.push(lambda);
        eigenvectors.push(positive_leading(vectors.column(i).iter().copied().collect()));
    }

    let mut trace_statistics = Vec::with_capacity(neqs);
    let mut max_eigen_statistics = Vec::with_capacity(neqs);
    let mut trace_critical_values = Vec::with_capacity(neqs);
    let mut max_eigen_critical_values = Vec::with_capacity(neqs);
    for r in 0..neqs {
        let tail: f64 = eigenvalues[r..].iter().map(|l| (1.0 - l).ln()).sum();
        trace_statistics.push(-tf * tail);
        max_eigen_statistics.push(-tf * (1.0 - eigenvalues[r]).ln());

        let remaining = neqs - r;
        let missing = || CointError::InvalidInput {
            field: "prices".into(),
            reason: format!("No critical values for {remaining} remaining relations"),
        };
        trace_critical_values.push(critical_values::trace(remaining).ok_or_else(missing)?);
        max_eigen_critical_values.push(critical_values::max_eigen(remaining).ok_or_else(missing)?);
    }

    tracing::debug!(
        neqs,
        lag_order,
        n_obs = t_eff,
        eigenvalues = ?eigenvalues,
        "Johansen decomposition"
    );

    Ok(JohansenResult {
        lag_order,
        n_obs: t_eff,
        eigenvalues,
        eigenvectors,
        trace_statistics,
        trace_critical_values,
        max_eigen_statistics,
        max_eigen_critical_values,
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn demean(m: &DMatrix<f64>) -> DMatrix<f64> {
    let mut out = m.clone();
    if out.nrows() == 0 {
        return out;
    }
    for mut column in out.column_iter_mut() {
        let mean = column.mean();
        column.add_scalar_mut(-mean);
    }
    out
}

/// Residual of `y` after projecting on the columns of `x`.
fn residualize(y: &DMatrix<f64>, x: &DMatrix<f64>) -> CointResult<DMatrix<f64>> {
    if x.ncols() == 0 {
        return Ok(y.clone());
    }
    let pinv = x
        .clone()
        .pseudo_inverse(1e-12)
        .map_err(|e| CointError::SingularMatrix {
            context: format!("Johansen lagged-difference projection: {e}"),
        })?;
    Ok(y - x * (pinv * y))
}

/// Flip the sign so the first non-zero component is positive.
fn positive_leading(mut v: Vec<f64>) -> Vec<f64> {
    if v.iter().find(|x| **x != 0.0).is_some_and(|x| *x < 0.0) {
        v.iter_mut().for_each(|x| *x = -*x);
    }
    v
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn walk(rng: &mut StdRng, n: usize) -> Vec<f64> {
        let mut level = 100.0;
        (0..n)
            .map(|_| {
                level += rng.gen_range(-1.0..1.0);
                level
            })
            .collect()
    }

    fn cointegrated_columns(n: usize, seed: u64) -> Vec<Vec<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let trend = walk(&mut rng, n);
        let a = trend.iter().map(|t| t + rng.gen_range(-0.5..0.5)).collect();
        let b = trend.iter().map(|t| 2.0 * t + rng.gen_range(-0.5..0.5)).collect();
        vec![a, b]
    }

    #[test]
    fn test_cointegrated_pair_has_rank() {
        let result = rank_test(&cointegrated_columns(500, 5), 1).unwrap();
        assert!(result.selected_rank >= 1);
        assert!(result.rank_passes[0]);
        let w = result.leading_weights();
        assert!((w[0] / w[1] + 2.0).abs() < 0.2, "weights {w:?}");
    }

    #[test]
    fn test_eigenvalues_sorted_and_bounded() {
        let j = johansen(&cointegrated_columns(300, 8), 1).unwrap();
        assert!(j.eigenvalues.windows(2).all(|w| w[0] >= w[1]));
        assert!(j.eigenvalues.iter().all(|l| (0.0..1.0).contains(l)));
        assert!(j.trace_statistics.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(j.n_obs, 300 - 2);
    }

    #[test]
    fn test_eigenvectors_leading_component_positive() {
        let j = johansen(&cointegrated_columns(200, 2), 2).unwrap();
        for v in &j.eigenvectors {
            assert!(v[0] >= 0.0);
        }
    }

    #[test]
    fn test_stationary_inputs_are_full_rank() {
        let mut rng = StdRng::seed_from_u64(17);
        let columns: Vec<Vec<f64>> = (0..2)
            .map(|_| (0..400).map(|_| 50.0 + rng.gen_range(-1.0..1.0)).collect())
            .collect();
        let result = rank_test(&columns, 1).unwrap();
        assert_eq!(result.selected_rank, 2);
        assert_eq!(result.highest_passing, 1);
    }

    #[test]
    fn test_independent_walks_rarely_cointegrated() {
        let found = (0..10)
            .filter(|seed| {
                let mut rng = StdRng::seed_from_u64(*seed);
                let columns = vec![walk(&mut rng, 300), walk(&mut rng, 300)];
                match rank_test(&columns, 1) {
                    Ok(_) => true,
                    Err(CointError::NoCointegration { ranks_tested }) => {
                        assert_eq!(ranks_tested, 2);
                        false
                    }
                    Err(e) => panic!("unexpected error {e}"),
                }
            })
            .count();
        assert!(found <= 3, "{found} of 10 spurious ranks");
    }

    #[test]
    fn test_lag_order_zero_supported() {
        let j = johansen(&cointegrated_columns(100, 4), 0).unwrap();
        assert_eq!(j.n_obs, 99);
    }

    #[test]
    fn test_insufficient_observations() {
        let columns = cointegrated_columns(6, 1);
        assert!(matches!(
            johansen(&columns, 1),
            Err(CointError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_huge_lag_order_is_insufficient_data() {
        let columns = cointegrated_columns(50, 1);
        assert!(matches!(
            rank_test(&columns, usize::MAX),
            Err(CointError::InsufficientData(_))
        ));
        assert!(matches!(
            rank_test(&columns, usize::MAX / 2),
            Err(CointError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_select_rank_keeps_highest_pass() {
        assert_eq!(select_rank(&[false, true]).unwrap(), 1);
        assert_eq!(select_rank(&[true, false, true]).unwrap(), 2);
        assert_eq!(select_rank(&[true, true, false]).unwrap(), 1);
    }

    #[test]
    fn test_select_rank_none_passing() {
        match select_rank(&[false, false]) {
            Err(CointError::NoCointegration { ranks_tested }) => assert_eq!(ranks_tested, 2),
            other => panic!("expected NoCointegration, got {other:?}"),
        }
    }

    #[test]
    fn test_single_instrument_rejected() {
        assert!(johansen(&[vec![1.0; 50]], 1).is_err());
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let mut columns = cointegrated_columns(50, 1);
        columns[1].pop();
        assert!(matches!(
            johansen(&columns, 1),
            Err(CointError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_positive_leading() {
        assert_eq!(positive_leading(vec![0.0, -2.0, 1.0]), vec![-0.0, 2.0, -1.0]);
        assert_eq!(positive_leading(vec![1.0, -1.0]), vec![1.0, -1.0]);
    }
}

use nalgebra::{DMatrix, DVector};

use crate::error::CointError;
use crate::CointResult;

/// Ordinary least squares fit.
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub coefficients: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub residuals: Vec<f64>,
    /// Sum of squared residuals
    pub ssr: f64,
    pub n_obs: usize,
}

impl OlsFit {
    pub fn t_value(&self, i: usize) -> f64 {
        self.coefficients[i] / self.std_errors[i]
    }

    /// Gaussian log-likelihood at the fitted coefficients.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.n_obs as f64;
        -n / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0)
    }

    /// Akaike information criterion, counting every column as a parameter.
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.coefficients.len() as f64
    }
}

/// Fit `y = X b + e` through the normal equations.
///
/// `context` names the calling stage in error messages.
pub fn fit(x: &DMatrix<f64>, y: &DVector<f64>, context: &str) -> CointResult<OlsFit> {
    let (n, k) = x.shape();
    if y.len() != n {
        return Err(CointError::LengthMismatch {
            context: format!("{context}: regressand vs design rows"),
            left: y.len(),
            right: n,
        });
    }
    if n <= k {
        return Err(CointError::InsufficientData(format!(
            "{context}: {n} observations for {k} regressors"
        )));
    }

    let xt = x.transpose();
    let xtx_inv = (&xt * x)
        .try_inverse()
        .ok_or_else(|| CointError::SingularMatrix {
            context: context.to_string(),
        })?;
    let beta = &xtx_inv * (&xt * y);

    let residuals = y - x * &beta;
    let ssr = residuals.dot(&residuals);
    let mse = ssr / (n - k) as f64;
    let std_errors = (0..k).map(|i| (mse * xtx_inv[(i, i)]).sqrt()).collect();

    Ok(OlsFit {
        coefficients: beta.iter().copied().collect(),
        std_errors,
        residuals: residuals.iter().copied().collect(),
        ssr,
        n_obs: n,
    })
}

/// Simple regression `y = alpha + beta * x`; returns (alpha, beta, fit).
pub fn fit_line(y: &[f64], x: &[f64], context: &str) -> CointResult<(f64, f64, OlsFit)> {
    let n = y.len();
    let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { x[i] });
    let result = fit(&design, &DVector::from_column_slice(y), context)?;
    Ok((result.coefficients[0], result.coefficients[1], result))
}

use serde::{Deserialize, Serialize};

use crate::error::CointError;
use crate::stats::descriptive::{mean, sample_std};
use crate::types::ZScore;
use crate::CointResult;

/// How the spread is centred and scaled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ZScoreMode {
    /// Mean and sample std of the whole series
    Global,
    /// Trailing window of `window` points including the current one
    Rolling { window: usize },
}

impl Default for ZScoreMode {
    fn default() -> Self {
        ZScoreMode::Rolling { window: 5 }
    }
}

/// Standard deviations below this fraction of the level count as zero.
const ZERO_STD_TOLERANCE: f64 = 1e-12;

/// Z-score of `spread`.
///
/// Rolling mode leaves the first `window - 1` entries undefined, as well as
/// any window whose values are all equal.
pub fn zscore_of(spread: &[f64], mode: ZScoreMode) -> CointResult<ZScore> {
    if let Some(t) = spread.iter().position(|v| !v.is_finite()) {
        return Err(CointError::InvalidInput {
            field: format!("spread[{t}]"),
            reason: "Spread contains non-finite values".into(),
        });
    }

    match mode {
        ZScoreMode::Global => {
            if spread.len() < 2 {
                return Err(CointError::InsufficientData(format!(
                    "Global z-score needs at least 2 points, got {}",
                    spread.len()
                )));
            }
            let m = mean(spread);
            let s = sample_std(spread);
            if is_zero_std(s, m) {
                return Err(CointError::DivisionByZero {
                    context: "global z-score: spread has zero standard deviation".into(),
                });
            }
            Ok(spread.iter().map(|x| Some((x - m) / s)).collect())
        }
        ZScoreMode::Rolling { window } => {
            if window < 2 {
                return Err(CointError::InvalidInput {
                    field: "window".into(),
                    reason: format!("Rolling window must be at least 2, got {window}"),
                });
            }
            if window > spread.len() {
                return Err(CointError::InsufficientData(format!(
                    "Rolling window of {} exceeds spread length {}",
                    window,
                    spread.len()
                )));
            }

            let mut z = vec![None; window - 1];
            z.extend(spread.windows(window).map(|w| {
                let m = mean(w);
                let s = sample_std(w);
                let last = w[window - 1];
                (!is_zero_std(s, m)).then(|| (last - m) / s)
            }));
            Ok(z)
        }
    }
}

fn is_zero_std(std: f64, level: f64) -> bool {
    std <= ZERO_STD_TOLERANCE * level.abs().max(1.0)
}

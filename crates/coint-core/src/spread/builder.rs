use crate::error::CointError;
use crate::types::{Spread, WeightVector};
use crate::CointResult;

/// Dot every row of the price matrix (one column per instrument) with
/// `weights`, optionally in log-price space.
pub fn build_spread(
    columns: &[Vec<f64>],
    weights: &[f64],
    use_log_prices: bool,
) -> CointResult<Spread> {
    if columns.is_empty() {
        return Err(CointError::InvalidInput {
            field: "prices".into(),
            reason: "At least one instrument is required to build a spread".into(),
        });
    }
    if weights.len() != columns.len() {
        return Err(CointError::DimensionMismatch {
            context: "spread weights vs instruments".into(),
            expected: columns.len(),
            actual: weights.len(),
        });
    }
    if let Some((j, w)) = weights.iter().enumerate().find(|(_, w)| !w.is_finite()) {
        return Err(CointError::InvalidInput {
            field: format!("weights[{j}]"),
            reason: format!("Weight must be finite, got {w}"),
        });
    }
    let n = columns[0].len();
    for (j, column) in columns.iter().enumerate() {
        if column.len() != n {
            return Err(CointError::LengthMismatch {
                context: format!("spread input column {j} vs column 0"),
                left: column.len(),
                right: n,
            });
        }
        let bad = column
            .iter()
            .position(|p| !p.is_finite() || (use_log_prices && *p <= 0.0));
        if let Some(t) = bad {
            return Err(CointError::InvalidInput {
                field: format!("prices[{j}][{t}]"),
                reason: if use_log_prices {
                    format!("Log prices need finite positive values, got {}", column[t])
                } else {
                    format!("Price must be finite, got {}", column[t])
                },
            });
        }
    }

    let spread = (0..n)
        .map(|t| {
            columns
                .iter()
                .zip(weights)
                .map(|(column, w)| {
                    let p = column[t];
                    w * if use_log_prices { p.ln() } else { p }
                })
                .sum::<f64>()
        })
        .collect();
    Ok(spread)
}

/// Rescale so the last instrument carries weight 1.
pub fn normalize(weights: &[f64]) -> CointResult<WeightVector> {
    let last = match weights.last() {
        Some(w) if *w != 0.0 && w.is_finite() => *w,
        _ => {
            return Err(CointError::DivisionByZero {
                context: "weight normalization — last component is zero or missing".into(),
            })
        }
    };
    Ok(weights.iter().map(|w| w / last).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unit_weights_give_price_difference() {
        let a = vec![10.0, 11.5, 9.0, 12.25];
        let b = vec![4.0, 5.0, 6.5, 3.0];
        let spread = build_spread(&[a.clone(), b.clone()], &[1.0, -1.0], false).unwrap();
        let expected: Vec<f64> = a.iter().zip(&b).map(|(x, y)| x - y).collect();
        assert_eq!(spread, expected);
    }

    #[test]
    fn test_log_space_spread() {
        let spread = build_spread(
            &[vec![std::f64::consts::E, 1.0], vec![1.0, std::f64::consts::E]],
            &[2.0, 1.0],
            true,
        )
        .unwrap();
        assert!((spread[0] - 2.0).abs() < 1e-12);
        assert!((spread[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_weight_count_mismatch() {
        let result = build_spread(&[vec![1.0], vec![2.0]], &[1.0], false);
        assert!(matches!(
            result,
            Err(CointError::DimensionMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_log_of_non_positive_price_rejected() {
        let result = build_spread(&[vec![1.0, 0.0]], &[1.0], true);
        assert!(matches!(result, Err(CointError::InvalidInput { .. })));
        assert!(build_spread(&[vec![1.0, 0.0]], &[1.0], false).is_ok());
    }

    #[test]
    fn test_normalize_sets_last_to_one() {
        let w = normalize(&[0.4, -0.2, 0.8]).unwrap();
        assert_eq!(w, vec![0.5, -0.25, 1.0]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in [
            vec![0.3, -1.7, 2.9],
            vec![-0.123_456_789, 0.987_654_321],
            vec![1e-7, 3.3e5, -4.1],
        ] {
            let once = normalize(&raw).unwrap();
            let twice = normalize(&once).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_normalize_zero_last_component() {
        assert!(matches!(
            normalize(&[1.0, 0.0]),
            Err(CointError::DivisionByZero { .. })
        ));
        assert!(normalize(&[]).is_err());
    }
}

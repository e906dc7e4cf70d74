use chrono::NaiveDate;
use coint_core::{
    analyze_mean_reversion, build_spread, generate_signals, normalize, pairwise_test, rank_test,
    run_backtest, zscore_of, CointError, MeanReversionInput, Position, PriceSeriesStore,
    SignalThresholds, ZScoreMode,
};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ===========================================================================
// End-to-end scenario on a trend + noise pair:
//   A = trend + noise, B = 2 * trend + noise
// ===========================================================================

fn trend_pair(n: usize, seed: u64) -> (Vec<f64>, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut trend = 100.0;
    let mut a = Vec::with_capacity(n);
    let mut b = Vec::with_capacity(n);
    for _ in 0..n {
        trend += rng.gen_range(-1.0..1.0);
        a.push(trend + rng.gen_range(-0.5..0.5));
        b.push(2.0 * trend + rng.gen_range(-0.5..0.5));
    }
    (a, b)
}

fn store(a: Vec<f64>, b: Vec<f64>) -> PriceSeriesStore {
    let start = NaiveDate::from_ymd_opt(2019, 3, 1).unwrap();
    let dates = (0..a.len())
        .map(|i| start + chrono::Days::new(i as u64))
        .collect();
    PriceSeriesStore::new(vec!["AAA".into(), "BBB".into()], dates, vec![a, b]).unwrap()
}

#[test]
fn test_pairwise_detects_cointegrated_pair() {
    let (a, b) = trend_pair(500, 21);
    let result = pairwise_test(&a, &b).unwrap();
    assert!(result.is_stationary, "p-value {}", result.p_value);
    assert!((result.hedge_ratio - 2.0).abs() < 0.1);
    assert!(result.half_life.is_some());
}

#[test]
fn test_rank_test_finds_relation() {
    let (a, b) = trend_pair(500, 21);
    let rank = rank_test(&[a, b], 1).unwrap();
    assert!(rank.selected_rank >= 1);
    assert_eq!(rank.rank_passes.len(), 2);
}

#[test]
fn test_stage_by_stage_matches_pipeline() {
    let (a, b) = trend_pair(400, 8);
    let columns = vec![a.clone(), b.clone()];

    let rank = rank_test(&columns, 1).unwrap();
    let weights = normalize(rank.leading_weights()).unwrap();
    let spread = build_spread(&columns, &weights, true).unwrap();
    let z = zscore_of(&spread, ZScoreMode::Rolling { window: 5 }).unwrap();
    let positions = generate_signals(&z, &SignalThresholds::default()).unwrap();
    let backtest = run_backtest(&spread, &positions).unwrap();

    let input: MeanReversionInput =
        serde_json::from_value(serde_json::json!({ "prices": store(a, b) })).unwrap();
    let out = analyze_mean_reversion(&input).unwrap();

    assert_eq!(out.result.normalized_weights, weights);
    assert_eq!(out.result.positions, positions);
    assert_eq!(
        out.result.backtest.summary.total_return,
        backtest.summary.total_return
    );
    // Cumulative returns are finite once the rolling window has warmed up
    assert!(backtest.cumulative_returns[4..].iter().all(|r| r.is_finite()));
}

#[test]
fn test_pipeline_output_serializes_without_nan() {
    let (a, b) = trend_pair(300, 2);
    let input: MeanReversionInput = serde_json::from_value(serde_json::json!({
        "prices": store(a, b),
        "thresholds": { "entry": 1.0, "exit": 0.0 },
        "zscore": { "mode": "rolling", "window": 20 }
    }))
    .unwrap();
    let out = analyze_mean_reversion(&input).unwrap();
    let json = serde_json::to_string(&out).unwrap();
    assert!(!json.contains("NaN"));
    assert!(out.result.trading_zscore[..19].iter().all(Option::is_none));
}

// ===========================================================================
// Error surfaces
// ===========================================================================

#[test]
fn test_pairwise_error_kinds() {
    let (a, b) = trend_pair(100, 1);
    assert!(matches!(
        pairwise_test(&a[..10], &b[..10]),
        Err(CointError::InsufficientData(_))
    ));
    assert!(matches!(
        pairwise_test(&a, &b[..99]),
        Err(CointError::LengthMismatch { .. })
    ));
}

#[test]
fn test_build_spread_dimension_mismatch() {
    let (a, b) = trend_pair(50, 1);
    assert!(matches!(
        build_spread(&[a, b], &[1.0, -2.0, 3.0], false),
        Err(CointError::DimensionMismatch { expected: 2, actual: 3, .. })
    ));
}

#[test]
fn test_normalize_zero_last_weight() {
    assert!(matches!(
        normalize(&[1.0, 0.0]),
        Err(CointError::DivisionByZero { .. })
    ));
}

#[test]
fn test_backtest_length_mismatch() {
    assert!(matches!(
        run_backtest(&[1.0, 2.0], &[Position::Flat]),
        Err(CointError::LengthMismatch { .. })
    ));
}

// ===========================================================================
// Properties
// ===========================================================================

#[test]
fn test_difference_spread_of_identical_series_is_zero() {
    let (a, _) = trend_pair(60, 4);
    let spread = build_spread(&[a.clone(), a], &[1.0, -1.0], false).unwrap();
    assert!(spread.iter().all(|s| *s == 0.0));
}

#[test]
fn test_all_flat_positions_earn_nothing() {
    let (a, _) = trend_pair(120, 6);
    let result = run_backtest(&a, &vec![Position::Flat; a.len()]).unwrap();
    assert!(result.cumulative_returns.iter().all(|r| *r == 0.0));
    assert_eq!(result.summary.total_return, 0.0);
}

#[test]
fn test_strategy_return_uses_previous_position() {
    let (a, _) = trend_pair(80, 9);
    let z = zscore_of(&a, ZScoreMode::Rolling { window: 10 }).unwrap();
    let positions = generate_signals(&z, &SignalThresholds::default()).unwrap();
    let result = run_backtest(&a, &positions).unwrap();
    assert_eq!(result.strategy_returns[0], 0.0);
    for t in 1..a.len() {
        let expected = positions[t - 1].sign() * (a[t] - a[t - 1]);
        assert_eq!(result.strategy_returns[t], expected);
    }
}

#[test]
fn test_signal_output_aligned_with_zscore() {
    let (a, _) = trend_pair(64, 12);
    let z = zscore_of(&a, ZScoreMode::Global).unwrap();
    let positions = generate_signals(&z, &SignalThresholds::default()).unwrap();
    assert_eq!(positions.len(), z.len());
}

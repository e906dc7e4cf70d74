use serde::{Deserialize, Serialize};

use crate::error::CointError;
use crate::stats::descriptive::{mean, sample_std};
use crate::types::Position;
use crate::CointResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Headline statistics of a backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    /// Final cumulative additive return
    pub total_return: f64,
    /// Final cumulative compounding return
    pub compounded_return: f64,
    /// Bars on which a new long or short position was opened
    pub trades: usize,
    /// Bars holding a non-flat position
    pub bars_in_market: usize,
    /// Largest peak-to-trough decline of the compounding equity curve
    pub max_drawdown: f64,
    /// Annualized (252 bars) Sharpe ratio of per-bar strategy returns
    pub sharpe_ratio: f64,
}

/// Bar-by-bar backtest output, index-aligned with the input spread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub positions: Vec<Position>,
    /// First difference of the spread, 0 on the first bar
    pub spread_returns: Vec<f64>,
    /// `position[t-1] * spread_return[t]`, 0 on the first bar
    pub strategy_returns: Vec<f64>,
    /// Running sum of strategy returns
    pub cumulative_returns: Vec<f64>,
    /// Running product of `1 + r`, minus one
    pub compounded_returns: Vec<f64>,
    pub summary: BacktestSummary,
}

const BARS_PER_YEAR: f64 = 252.0;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Backtest `positions` over `spread` with a one-bar execution lag: the
/// position decided at the close of bar `t-1` earns the spread change of bar
/// `t`.
pub fn run_backtest(spread: &[f64], positions: &[Position]) -> CointResult<BacktestResult> {
    if spread.len() != positions.len() {
        return Err(CointError::LengthMismatch {
            context: "backtest spread vs positions".into(),
            left: spread.len(),
            right: positions.len(),
        });
    }
    if spread.is_empty() {
        return Err(CointError::InsufficientData(
            "Backtest needs at least one bar".into(),
        ));
    }
    if let Some(t) = spread.iter().position(|v| !v.is_finite()) {
        return Err(CointError::InvalidInput {
            field: format!("spread[{t}]"),
            reason: "Spread contains non-finite values".into(),
        });
    }

    let spread_returns: Vec<f64> = std::iter::once(0.0)
        .chain(spread.windows(2).map(|w| w[1] - w[0]))
        .collect();

    let strategy_returns: Vec<f64> = std::iter::once(0.0)
        .chain(
            positions
                .iter()
                .zip(&spread_returns[1..])
                .map(|(held, r)| held.sign() * r),
        )
        .collect();

    let cumulative_returns: Vec<f64> = strategy_returns
        .iter()
        .scan(0.0, |acc, r| {
            *acc += r;
            Some(*acc)
        })
        .collect();

    let compounded_returns: Vec<f64> = strategy_returns
        .iter()
        .scan(1.0, |equity, r| {
            *equity *= 1.0 + r;
            Some(*equity - 1.0)
        })
        .collect();

    let summary = BacktestSummary {
        total_return: *cumulative_returns.last().unwrap_or(&0.0),
        compounded_return: *compounded_returns.last().unwrap_or(&0.0),
        trades: count_trades(positions),
        bars_in_market: positions.iter().filter(|p| !p.is_flat()).count(),
        max_drawdown: compute_max_drawdown(&compounded_returns),
        sharpe_ratio: compute_sharpe(&strategy_returns),
    };

    tracing::debug!(
        bars = spread.len(),
        trades = summary.trades,
        total_return = summary.total_return,
        compounded_return = summary.compounded_return,
        "backtest complete"
    );

    Ok(BacktestResult {
        positions: positions.to_vec(),
        spread_returns,
        strategy_returns,
        cumulative_returns,
        compounded_returns,
        summary,
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn count_trades(positions: &[Position]) -> usize {
    positions
        .iter()
        .scan(Position::Flat, |prev, p| {
            let opened = !p.is_flat() && *p != *prev;
            *prev = *p;
            Some(opened)
        })
        .filter(|opened| *opened)
        .count()
}

/// Maximum drawdown of the equity curve `1 + compounded`.
fn compute_max_drawdown(compounded: &[f64]) -> f64 {
    let mut peak = 1.0_f64;
    let mut max_dd = 0.0_f64;
    for c in compounded {
        let equity = 1.0 + c;
        peak = peak.max(equity);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - equity) / peak);
        }
    }
    max_dd
}

/// Annualized Sharpe ratio from per-bar returns.
/// Sharpe = mean(r) / std(r) * sqrt(252)
fn compute_sharpe(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = sample_std(returns);
    if std == 0.0 {
        return 0.0;
    }
    mean(returns) / std * BARS_PER_YEAR.sqrt()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Position::{Flat, Long, Short};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_one_bar_execution_lag() {
        let spread = [10.0, 11.0, 13.0, 12.0];
        let positions = [Long, Long, Short, Flat];
        let result = run_backtest(&spread, &positions).unwrap();
        assert_eq!(result.spread_returns, vec![0.0, 1.0, 2.0, -1.0]);
        // bar 1 earns bar 0's Long, bar 3 earns bar 2's Short
        assert_eq!(result.strategy_returns, vec![0.0, 1.0, 2.0, 1.0]);
        assert_eq!(result.cumulative_returns, vec![0.0, 1.0, 3.0, 4.0]);
        assert_eq!(result.compounded_returns, vec![0.0, 1.0, 5.0, 11.0]);
    }

    #[test]
    fn test_first_bar_earns_nothing() {
        let result = run_backtest(&[1.0, 5.0], &[Long, Long]).unwrap();
        assert_eq!(result.strategy_returns[0], 0.0);
        assert_eq!(result.strategy_returns[1], 4.0);
    }

    #[test]
    fn test_all_flat_is_identically_zero() {
        let spread: Vec<f64> = (0..50).map(|i| (i as f64 * 0.7).sin() * 3.0).collect();
        let result = run_backtest(&spread, &vec![Flat; 50]).unwrap();
        assert!(result.cumulative_returns.iter().all(|r| *r == 0.0));
        assert!(result.compounded_returns.iter().all(|r| *r == 0.0));
        assert_eq!(result.summary.trades, 0);
        assert_eq!(result.summary.sharpe_ratio, 0.0);
        assert_eq!(result.summary.max_drawdown, 0.0);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            run_backtest(&[1.0, 2.0, 3.0], &[Flat, Flat]),
            Err(CointError::LengthMismatch { left: 3, right: 2, .. })
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(run_backtest(&[], &[]).is_err());
    }

    #[test]
    fn test_trade_counting() {
        let positions = [Flat, Long, Long, Flat, Short, Short, Long, Flat];
        assert_eq!(count_trades(&positions), 3);
        let result = run_backtest(&[0.0; 8], &positions).unwrap();
        assert_eq!(result.summary.bars_in_market, 5);
    }

    #[test]
    fn test_max_drawdown() {
        // equity 1.1 -> 0.88 -> 0.924
        let compounded = [0.1, -0.12, -0.076];
        let dd = compute_max_drawdown(&compounded);
        assert!((dd - 0.2).abs() < 1e-12);
        assert_eq!(compute_max_drawdown(&[0.01, 0.02, 0.05]), 0.0);
    }

    #[test]
    fn test_sharpe_sign() {
        assert!(compute_sharpe(&[0.01, 0.02, 0.015, 0.03]) > 0.0);
        assert!(compute_sharpe(&[-0.01, -0.02, -0.015]) < 0.0);
        assert_eq!(compute_sharpe(&[0.0; 10]), 0.0);
    }
}

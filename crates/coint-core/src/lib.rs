pub mod backtest;
pub mod cointegration;
pub mod error;
pub mod pipeline;
pub mod prices;
pub mod signals;
pub mod spread;
pub mod stats;
pub mod types;

#[cfg(feature = "synthetic")]
pub mod synthetic;

pub use backtest::{run_backtest, BacktestResult, BacktestSummary};
pub use cointegration::{pairwise_test, rank_test, PairwiseResult, RankResult};
pub use error::CointError;
pub use pipeline::{analyze_mean_reversion, MeanReversionInput, MeanReversionOutput};
pub use prices::{InMemoryProvider, PriceProvider, PriceSeriesStore};
pub use signals::{generate_signals, SignalThresholds};
pub use spread::{build_spread, normalize, zscore_of, ZScoreMode};
pub use stats::adf_test;
pub use types::*;

/// Standard result type for all coint operations
pub type CointResult<T> = Result<T, CointError>;

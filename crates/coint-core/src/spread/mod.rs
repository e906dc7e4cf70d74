pub mod builder;
pub mod zscore;

pub use builder::{build_spread, normalize};
pub use zscore::{zscore_of, ZScoreMode};

pub use crate::stats::descriptive::{describe, SeriesSummary as SpreadSummary};

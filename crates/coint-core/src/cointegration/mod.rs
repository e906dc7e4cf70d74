pub mod critical_values;
pub mod johansen;
pub mod pairwise;

pub use critical_values::CriticalLevels;
pub use johansen::{johansen, rank_test, JohansenResult, RankResult};
pub use pairwise::{pairwise_test, PairwiseResult};

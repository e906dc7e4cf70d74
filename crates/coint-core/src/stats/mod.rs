pub mod adf;
pub mod descriptive;
pub mod ols;

pub use adf::{adf_test, AdfResult, CriticalValues};

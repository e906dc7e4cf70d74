pub mod analyze;
pub mod cointegration;
pub mod simulate;
pub mod spread;
pub mod strategy;

use std::time::Instant;

use coint_core::with_metadata;
use serde::Serialize;
use serde_json::Value;

/// Wrap a stage result in the standard output envelope.
pub(crate) fn envelope<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    start: Instant,
    result: T,
) -> Result<Value, Box<dyn std::error::Error>> {
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(serde_json::to_value(with_metadata(
        methodology,
        assumptions,
        warnings,
        elapsed,
        result,
    ))?)
}

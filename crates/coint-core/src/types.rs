use serde::{Deserialize, Serialize};

use crate::error::CointError;

/// Ticker symbol identifying one price column.
pub type Instrument = String;

/// Linear combination weights, one per instrument.
pub type WeightVector = Vec<f64>;

/// Spread series: price (or log-price) rows dotted with a weight vector.
pub type Spread = Vec<f64>;

/// Z-score series; `None` where the value is undefined.
pub type ZScore = Vec<Option<f64>>;

/// Discrete position held over one bar.
///
/// Serialized as `1`, `-1` or `0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Position {
    Long,
    Short,
    #[default]
    Flat,
}

impl Position {
    /// Signed exposure to the spread.
    pub fn sign(self) -> f64 {
        match self {
            Position::Long => 1.0,
            Position::Short => -1.0,
            Position::Flat => 0.0,
        }
    }

    pub fn is_flat(self) -> bool {
        self == Position::Flat
    }
}

impl From<Position> for i8 {
    fn from(p: Position) -> i8 {
        match p {
            Position::Long => 1,
            Position::Short => -1,
            Position::Flat => 0,
        }
    }
}

impl TryFrom<i8> for Position {
    type Error = CointError;

    fn try_from(v: i8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Position::Long),
            -1 => Ok(Position::Short),
            0 => Ok(Position::Flat),
            other => Err(CointError::InvalidInput {
                field: "position".into(),
                reason: format!("expected 1, -1 or 0, got {other}"),
            }),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "ieee754_f64".to_string(),
        },
    }
}

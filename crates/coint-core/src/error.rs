use thiserror::Error;

#[derive(Debug, Error)]
pub enum CointError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Length mismatch in {context}: {left} vs {right}")]
    LengthMismatch {
        context: String,
        left: usize,
        right: usize,
    },

    #[error("No cointegration: no rank out of {ranks_tested} exceeds its 95% critical value")]
    NoCointegration { ranks_tested: usize },

    #[error("Singular matrix in {context}")]
    SingularMatrix { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CointError {
    fn from(e: serde_json::Error) -> Self {
        CointError::SerializationError(e.to_string())
    }
}

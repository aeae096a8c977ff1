//! Error types for the evaluation pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, EvalError>;

/// Main error type for the evaluation pipeline
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Insufficient data: need at least {needed} records, got {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error("Degenerate metric: {0}")]
    DegenerateMetric(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl EvalError {
    /// Shorthand for an `InvalidParameter` error
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        EvalError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for EvalError {
    fn from(err: serde_json::Error) -> Self {
        EvalError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EvalError::invalid_parameter("k", 1, "must be at least 2");
        assert_eq!(err.to_string(), "Invalid parameter: k = 1, must be at least 2");
    }

    #[test]
    fn test_insufficient_data_display() {
        let err = EvalError::InsufficientData { needed: 4, available: 2 };
        assert_eq!(
            err.to_string(),
            "Insufficient data: need at least 4 records, got 2"
        );
    }
}

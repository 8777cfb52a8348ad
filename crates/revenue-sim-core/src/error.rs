use thiserror::Error;

#[derive(Debug, Error)]
pub enum RevenueSimError {
    #[error("Invalid recognition rule '{rule}': {reason}")]
    Configuration { rule: String, reason: String },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for RevenueSimError {
    fn from(e: serde_json::Error) -> Self {
        RevenueSimError::SerializationError(e.to_string())
    }
}

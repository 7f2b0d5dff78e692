use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoanError {
    /// Malformed, missing or incoercible request input. The message is client-facing.
    #[error("{0}")]
    Validation(String),

    /// No trained classifier is available to the cascade.
    #[error("{0}")]
    ModelUnavailable(String),

    #[error("Prediction error: {0}")]
    Inference(String),

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("I/O error on '{path}': {reason}")]
    Io { path: String, reason: String },
}

impl LoanError {
    /// Status code an HTTP boundary should answer with for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            LoanError::Validation(_) => 400,
            _ => 500,
        }
    }
}

impl From<serde_json::Error> for LoanError {
    fn from(e: serde_json::Error) -> Self {
        LoanError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_passed_through() {
        let err = LoanError::Validation("Missing field: loan_amount".into());
        assert_eq!(err.to_string(), "Missing field: loan_amount");
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn test_inference_errors_are_server_side() {
        let err = LoanError::Inference("tree has no nodes".into());
        assert_eq!(err.to_string(), "Prediction error: tree has no nodes");
        assert_eq!(err.http_status(), 500);
        assert_eq!(LoanError::ModelUnavailable("x".into()).http_status(), 500);
    }
}

//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Invalid prediction: {0}")]
    InvalidPrediction(String),

    #[error("Invalid relevance score {0}, expected 1-6")]
    InvalidRelevance(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = DomainError::InvalidQuestion("empty title".to_string());
        assert_eq!(error.to_string(), "Invalid question: empty title");
    }
}

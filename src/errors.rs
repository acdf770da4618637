//! Error types for SecBuddy
//!
//! Every assessment error is locally recoverable; none of them should take
//! the process down.

use thiserror::Error;

/// Main error type for the assessment engine and its collaborators
#[derive(Error, Debug)]
pub enum AssessError {
    /// Selection referenced a question that is not in the catalog
    #[error("Unknown question id: {id}")]
    InvalidQuestionId { id: String },

    /// Selection used an option the question does not offer
    #[error("Option {option:?} is not offered by question {question_id}")]
    InvalidOption { question_id: String, option: String },

    /// User tried to proceed before answering every question
    #[error("Please answer all questions before proceeding ({} unanswered: {})", missing.len(), missing.join(", "))]
    IncompleteAssessment { missing: Vec<String> },

    /// Scoring engine was handed an incomplete answer set
    #[error("Cannot score an incomplete answer set (missing: {})", missing.join(", "))]
    IncompleteInput { missing: Vec<String> },

    /// State machine transition errors
    #[error("Invalid phase transition from {from} via {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    /// Question catalog failed validation
    #[error("Invalid question catalog: {0}")]
    InvalidCatalog(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Text completion endpoint errors
    #[error("Completion API error: {0}")]
    CompletionApiError(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic errors with context
    #[error("Error: {0}")]
    Generic(String),
}

/// Result type alias for assessment operations
pub type Result<T> = std::result::Result<T, AssessError>;

/// Convert anyhow errors to AssessError
impl From<anyhow::Error> for AssessError {
    fn from(err: anyhow::Error) -> Self {
        AssessError::Generic(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_assessment_lists_missing() {
        let err = AssessError::IncompleteAssessment {
            missing: vec!["usesVPN".to_string(), "deviceUpdates".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 unanswered"));
        assert!(msg.contains("usesVPN"));
        assert!(msg.contains("deviceUpdates"));
    }

    #[test]
    fn test_invalid_question_error() {
        let err = AssessError::InvalidQuestionId {
            id: "firewall".to_string(),
        };
        assert!(err.to_string().contains("firewall"));
    }

    #[test]
    fn test_invalid_transition_error() {
        let err = AssessError::InvalidTransition {
            from: "Welcome".to_string(),
            to: "Proceed".to_string(),
            reason: "Assessment not started".to_string(),
        };
        assert!(err.to_string().contains("Welcome"));
        assert!(err.to_string().contains("Proceed"));
    }
}

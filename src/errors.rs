/// Domain-specific error types for casetwin
///
/// Only retrieval-layer failures are fatal to a query. Payload-shape and
/// profile-shape irregularities are absorbed per-field by the fallback
/// chains in the result mapper and contribute zero in the context scorer.

#[derive(Debug, thiserror::Error)]
pub enum CasetwinError {
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for CasetwinError {
    fn from(e: reqwest::Error) -> Self {
        CasetwinError::Retrieval(e.to_string())
    }
}

impl CasetwinError {
    /// Helper to create validation errors with field names
    pub fn validation(field: &str, message: &str) -> Self {
        CasetwinError::Validation {
            message: message.to_string(),
            field: Some(field.to_string()),
        }
    }
}

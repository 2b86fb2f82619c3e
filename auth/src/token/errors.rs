use thiserror::Error;

/// Error type for token generation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Failed to generate token: {0}")]
    GenerationFailed(String),
}

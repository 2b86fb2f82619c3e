use thiserror::Error;

/// Error type for Basic authorization header decoding.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BasicAuthError {
    #[error("Authorization header does not use the Basic scheme")]
    MissingScheme,

    #[error("Authorization header is not valid base64 UTF-8: {0}")]
    InvalidEncoding(String),

    #[error("Decoded credentials are missing the ':' separator")]
    MissingSeparator,
}

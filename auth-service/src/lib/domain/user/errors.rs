use thiserror::Error;

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error raised by user persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("No user matches the given filter")]
    NotFound,

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Email already exists: {0}")]
    DuplicateEmail(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Top-level error for authentication operations.
///
/// Repository errors never reach callers as-is; they are translated into
/// these outcomes.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("User {0} already exists")]
    AlreadyRegistered(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid reset token")]
    InvalidResetToken,

    #[error("Password error: {0}")]
    Password(#[from] auth::PasswordError),

    #[error("Token error: {0}")]
    Token(#[from] auth::TokenError),

    // Infrastructure errors
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => AuthError::UserNotFound,
            RepositoryError::DuplicateEmail(email) => AuthError::AlreadyRegistered(email),
            RepositoryError::InvalidFilter(_) | RepositoryError::Database(_) => {
                AuthError::Persistence(err.to_string())
            }
        }
    }
}

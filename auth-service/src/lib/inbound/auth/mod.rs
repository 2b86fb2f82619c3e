//! Request-level authentication.
//!
//! The web layer builds a [`RequestContext`] from the incoming request and
//! picks one [`RequestAuthenticator`] variant per route.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::user::models::User;
use crate::user::errors::AuthError;

pub mod basic;
pub mod policy;
pub mod session;

pub use basic::BasicAuth;
pub use policy::AuthPolicy;
pub use session::SessionAuth;

/// Framework-agnostic view of the parts of a request used for authentication.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub path: Option<String>,
    pub authorization: Option<String>,
    pub session_cookie: Option<String>,
}

/// Outcome of a failed user resolution.
#[derive(Debug, Clone, Error)]
pub enum AccessError {
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error(transparent)]
    Service(#[from] AuthError),
}

/// Resolves the user behind a request.
#[async_trait]
pub trait RequestAuthenticator: Send + Sync + 'static {
    /// Resolve the authenticated user of a request.
    ///
    /// # Errors
    /// * `Unauthenticated` - Request carries no valid credentials
    /// * `Service` - Credential lookup failed
    async fn resolve_user(&self, request: &RequestContext) -> Result<User, AccessError>;
}

/// Variant for routes without authentication: nobody is ever resolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

#[async_trait]
impl RequestAuthenticator for NoAuth {
    async fn resolve_user(&self, _request: &RequestContext) -> Result<User, AccessError> {
        Err(AccessError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_auth_never_resolves() {
        let request = RequestContext {
            path: Some("/api/v1/status".to_string()),
            authorization: Some("Basic Ym9iQGV4YW1wbGUuY29tOnB3ZA==".to_string()),
            session_cookie: Some("abc".to_string()),
        };

        let result = NoAuth.resolve_user(&request).await;

        assert!(matches!(result, Err(AccessError::Unauthenticated)));
    }
}

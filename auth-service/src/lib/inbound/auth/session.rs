use std::sync::Arc;

use async_trait::async_trait;

use super::AccessError;
use super::RequestAuthenticator;
use super::RequestContext;
use crate::domain::user::models::User;
use crate::domain::user::ports::AuthServicePort;

/// Default name of the cookie carrying the session ID.
pub const SESSION_COOKIE: &str = "session_id";

/// Authenticates requests by the session ID in their cookie.
pub struct SessionAuth<S>
where
    S: AuthServicePort,
{
    service: Arc<S>,
    cookie_name: String,
}

impl<S> SessionAuth<S>
where
    S: AuthServicePort,
{
    pub fn new(service: Arc<S>) -> Self {
        Self::with_cookie_name(service, SESSION_COOKIE)
    }

    pub fn with_cookie_name(service: Arc<S>, cookie_name: impl Into<String>) -> Self {
        Self {
            service,
            cookie_name: cookie_name.into(),
        }
    }

    /// Name of the cookie the web layer should read into
    /// [`RequestContext::session_cookie`].
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }
}

#[async_trait]
impl<S> RequestAuthenticator for SessionAuth<S>
where
    S: AuthServicePort,
{
    async fn resolve_user(&self, request: &RequestContext) -> Result<User, AccessError> {
        self.service
            .get_user_from_session(request.session_cookie.as_deref())
            .await?
            .ok_or(AccessError::Unauthenticated)
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use auth::BasicCredentials;

use super::AccessError;
use super::RequestAuthenticator;
use super::RequestContext;
use crate::domain::user::models::User;
use crate::domain::user::ports::AuthServicePort;

/// Authenticates requests carrying `Authorization: Basic base64(email:password)`.
pub struct BasicAuth<S>
where
    S: AuthServicePort,
{
    service: Arc<S>,
}

impl<S> BasicAuth<S>
where
    S: AuthServicePort,
{
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> RequestAuthenticator for BasicAuth<S>
where
    S: AuthServicePort,
{
    async fn resolve_user(&self, request: &RequestContext) -> Result<User, AccessError> {
        let header = request
            .authorization
            .as_deref()
            .ok_or(AccessError::Unauthenticated)?;

        let credentials = BasicCredentials::from_header(header).map_err(|e| {
            tracing::warn!("Basic authorization rejected: {}", e);
            AccessError::Unauthenticated
        })?;

        self.service
            .authenticate(&credentials.email, &credentials.password)
            .await?
            .ok_or(AccessError::Unauthenticated)
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::ResetToken;
use crate::domain::user::models::SessionId;
use crate::domain::user::models::User;
use crate::domain::user::models::UserFilter;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserPatch;
use crate::user::errors::AuthError;
use crate::user::errors::RepositoryError;
use crate::user::ports::AuthServicePort;
use crate::user::ports::UserRepository;

/// Domain service implementation for authentication.
///
/// Concrete implementation of AuthServicePort with dependency injection. All
/// persistence goes through the repository; all credential hashing goes
/// through the password hasher, on the blocking thread pool.
pub struct AuthService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    password_hasher: PasswordHasher,
}

impl<UR> AuthService<UR>
where
    UR: UserRepository,
{
    /// Create a new auth service with the default password work factor.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    ///
    /// # Returns
    /// Configured auth service instance
    pub fn new(repository: Arc<UR>) -> Self {
        Self::with_hasher(repository, PasswordHasher::new())
    }

    /// Create a new auth service with an explicit password hasher.
    pub fn with_hasher(repository: Arc<UR>, password_hasher: PasswordHasher) -> Self {
        Self {
            repository,
            password_hasher,
        }
    }

    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.password_hasher.clone();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Unknown(format!("Password hashing task failed: {}", e)))?
            .map_err(AuthError::from)
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let hasher = self.password_hasher.clone();
        let password = password.to_string();
        let hash = hash.to_string();

        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Unknown(format!("Password verification task failed: {}", e)))?
            .map_err(AuthError::from)
    }

    /// Look a user up by email, treating malformed and unknown emails alike.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let Ok(email) = EmailAddress::new(email.to_string()) else {
            return Ok(None);
        };

        match self
            .repository
            .find_user_by(&UserFilter::by_email(&email))
            .await
        {
            Ok(user) => Ok(Some(user)),
            Err(RepositoryError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl<UR> AuthServicePort for AuthService<UR>
where
    UR: UserRepository,
{
    #[tracing::instrument(skip_all)]
    async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = EmailAddress::new(email.to_string())?;

        // Fast path; the store's unique constraint closes the race below.
        match self
            .repository
            .find_user_by(&UserFilter::by_email(&email))
            .await
        {
            Ok(_) => return Err(AuthError::AlreadyRegistered(email.to_string())),
            Err(RepositoryError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let hashed_password = self.hash_password(password).await?;

        let user = self
            .repository
            .add_user(&email, &hashed_password)
            .await
            .map_err(|e| match e {
                RepositoryError::DuplicateEmail(_) => {
                    AuthError::AlreadyRegistered(email.to_string())
                }
                other => {
                    tracing::error!(error = %other, "Failed to add user");
                    AuthError::from(other)
                }
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    async fn valid_login(&self, email: &str, password: &str) -> Result<bool, AuthError> {
        self.authenticate(email, password)
            .await
            .map(|user| user.is_some())
    }

    #[tracing::instrument(skip_all)]
    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>, AuthError> {
        let Some(user) = self.find_by_email(email).await? else {
            tracing::warn!("Login attempt for unknown email");
            return Ok(None);
        };

        if self.verify_password(password, &user.hashed_password).await? {
            Ok(Some(user))
        } else {
            tracing::warn!(user_id = %user.id, "Login attempt with wrong password");
            Ok(None)
        }
    }

    #[tracing::instrument(skip_all)]
    async fn create_session(&self, email: &str) -> Result<SessionId, AuthError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let session_id = SessionId::new(auth::generate_token()?);
        self.repository
            .update_user(user.id, &UserPatch::new().session_id(Some(&session_id)))
            .await?;

        tracing::info!(user_id = %user.id, "Session created");
        Ok(session_id)
    }

    async fn get_user_from_session(
        &self,
        session_id: Option<&str>,
    ) -> Result<Option<User>, AuthError> {
        let Some(session_id) = session_id.filter(|s| !s.is_empty()) else {
            return Ok(None);
        };

        match self
            .repository
            .find_user_by(&UserFilter::by_session_id(session_id))
            .await
        {
            Ok(user) => Ok(Some(user)),
            Err(RepositoryError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn destroy_session(&self, user_id: UserId) -> Result<(), AuthError> {
        self.repository
            .update_user(user_id, &UserPatch::new().session_id(None))
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::from(other),
            })?;

        tracing::info!(user_id = %user_id, "Session destroyed");
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    async fn request_reset_token(&self, email: &str) -> Result<ResetToken, AuthError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let reset_token = ResetToken::new(auth::generate_token()?);
        self.repository
            .update_user(user.id, &UserPatch::new().reset_token(Some(&reset_token)))
            .await?;

        tracing::info!(user_id = %user.id, "Reset token issued");
        Ok(reset_token)
    }

    #[tracing::instrument(skip_all)]
    async fn update_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if reset_token.is_empty() {
            return Err(AuthError::InvalidResetToken);
        }

        let user = self
            .repository
            .find_user_by(&UserFilter::by_reset_token(reset_token))
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::InvalidResetToken,
                other => AuthError::from(other),
            })?;

        let hashed_password = self.hash_password(new_password).await?;
        let patch = UserPatch::new()
            .hashed_password(hashed_password)
            .reset_token(None);

        // Only the caller that still finds the token stored consumes it.
        self.repository
            .update_user_if(user.id, &UserFilter::by_reset_token(reset_token), &patch)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::InvalidResetToken,
                other => AuthError::from(other),
            })?;

        tracing::info!(user_id = %user.id, "Password updated");
        Ok(())
    }
}

use async_trait::async_trait;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::ResetToken;
use crate::domain::user::models::SessionId;
use crate::domain::user::models::User;
use crate::domain::user::models::UserFilter;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserPatch;
use crate::user::errors::AuthError;
use crate::user::errors::RepositoryError;

/// Port for authentication operations consumed by the request layer.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new user.
    ///
    /// # Arguments
    /// * `email` - Email address identifying the account
    /// * `password` - Plaintext password (hashed before storage)
    ///
    /// # Returns
    /// Created user entity
    ///
    /// # Errors
    /// * `InvalidEmail` - Email is not a valid address
    /// * `AlreadyRegistered` - Email is already registered
    /// * `Persistence` - Storage operation failed
    async fn register(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Check a pair of credentials.
    ///
    /// Unknown emails are a normal negative answer, not an error.
    ///
    /// # Returns
    /// True iff a user with `email` exists and `password` matches its hash
    ///
    /// # Errors
    /// * `Password` - Stored hash is malformed
    /// * `Persistence` - Storage operation failed
    async fn valid_login(&self, email: &str, password: &str) -> Result<bool, AuthError>;

    /// Resolve the user owning a pair of credentials.
    ///
    /// # Returns
    /// The user when the credentials are valid, `None` otherwise
    ///
    /// # Errors
    /// * `Password` - Stored hash is malformed
    /// * `Persistence` - Storage operation failed
    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>, AuthError>;

    /// Start a session, replacing any session the user already had.
    ///
    /// # Returns
    /// Fresh session ID
    ///
    /// # Errors
    /// * `UserNotFound` - No user with this email
    /// * `Persistence` - Storage operation failed
    async fn create_session(&self, email: &str) -> Result<SessionId, AuthError>;

    /// Resolve the user holding a session.
    ///
    /// Absent or empty session IDs resolve to `None` without a lookup.
    ///
    /// # Errors
    /// * `Persistence` - Storage operation failed
    async fn get_user_from_session(
        &self,
        session_id: Option<&str>,
    ) -> Result<Option<User>, AuthError>;

    /// End the session of a user. Ending an absent session is a no-op.
    ///
    /// # Errors
    /// * `UserNotFound` - No user with this ID
    /// * `Persistence` - Storage operation failed
    async fn destroy_session(&self, user_id: UserId) -> Result<(), AuthError>;

    /// Issue a password reset token, replacing any pending one.
    ///
    /// # Errors
    /// * `UserNotFound` - No user with this email
    /// * `Persistence` - Storage operation failed
    async fn request_reset_token(&self, email: &str) -> Result<ResetToken, AuthError>;

    /// Consume a reset token and set a new password.
    ///
    /// # Errors
    /// * `InvalidResetToken` - No user holds this pending token
    /// * `Persistence` - Storage operation failed
    async fn update_password(&self, reset_token: &str, new_password: &str)
        -> Result<(), AuthError>;
}

/// Persistence operations for user records.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist a new user with a freshly assigned ID.
    ///
    /// # Arguments
    /// * `email` - Validated email address
    /// * `hashed_password` - Password hash in PHC string format
    ///
    /// # Returns
    /// Created user entity, without session or reset token
    ///
    /// # Errors
    /// * `DuplicateEmail` - Email is already registered
    /// * `Database` - Storage operation failed
    async fn add_user(
        &self,
        email: &EmailAddress,
        hashed_password: &str,
    ) -> Result<User, RepositoryError>;

    /// Retrieve the first user matching every condition of a filter.
    ///
    /// Matches are ordered by ascending ID.
    ///
    /// # Errors
    /// * `NotFound` - No user matches
    /// * `Database` - Storage operation failed
    async fn find_user_by(&self, filter: &UserFilter) -> Result<User, RepositoryError>;

    /// Apply all assignments of a patch to one user atomically.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `InvalidFilter` - Patch carries a value the store cannot hold
    /// * `DuplicateEmail` - New email belongs to another user
    /// * `Database` - Storage operation failed
    async fn update_user(&self, id: UserId, patch: &UserPatch) -> Result<(), RepositoryError>;

    /// Apply a patch to one user only while it still matches `condition`.
    ///
    /// The check and the write are a single atomic step, so of several
    /// concurrent callers with the same condition at most one succeeds when
    /// the patch invalidates it.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist or no longer matches
    /// * `InvalidFilter` - Patch carries a value the store cannot hold
    /// * `DuplicateEmail` - New email belongs to another user
    /// * `Database` - Storage operation failed
    async fn update_user_if(
        &self,
        id: UserId,
        condition: &UserFilter,
        patch: &UserPatch,
    ) -> Result<(), RepositoryError>;
}

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserFilter;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserPatch;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::RepositoryError;

#[derive(Default)]
struct Users {
    last_id: i64,
    // Ordered by id, so the first match of a scan is the lowest id.
    by_id: BTreeMap<UserId, User>,
}

impl Users {
    fn update(
        &mut self,
        id: UserId,
        condition: Option<&UserFilter>,
        patch: &UserPatch,
    ) -> Result<(), RepositoryError> {
        let current = self.by_id.get(&id).ok_or(RepositoryError::NotFound)?;
        if condition.is_some_and(|condition| !condition.matches(current)) {
            return Err(RepositoryError::NotFound);
        }
        let updated = patch.apply(current)?;

        if updated.email != current.email && self.email_taken(&updated.email, Some(id)) {
            return Err(RepositoryError::DuplicateEmail(updated.email.to_string()));
        }

        self.by_id.insert(id, updated);
        Ok(())
    }

    fn email_taken(&self, email: &EmailAddress, except: Option<UserId>) -> bool {
        self.by_id
            .values()
            .any(|user| user.email == *email && Some(user.id) != except)
    }
}

/// Process-local user store.
///
/// Readers share the lock; every write holds it exclusively for the whole
/// check-and-apply, so patches are never observed half applied.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Users>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn add_user(
        &self,
        email: &EmailAddress,
        hashed_password: &str,
    ) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;

        if users.email_taken(email, None) {
            return Err(RepositoryError::DuplicateEmail(email.to_string()));
        }

        users.last_id += 1;
        let user = User {
            id: UserId(users.last_id),
            email: email.clone(),
            hashed_password: hashed_password.to_string(),
            session_id: None,
            reset_token: None,
        };
        users.by_id.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user_by(&self, filter: &UserFilter) -> Result<User, RepositoryError> {
        if filter.conditions().is_empty() {
            return Err(RepositoryError::InvalidFilter("empty filter".to_string()));
        }

        self.users
            .read()
            .await
            .by_id
            .values()
            .find(|user| filter.matches(user))
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn update_user(&self, id: UserId, patch: &UserPatch) -> Result<(), RepositoryError> {
        self.users.write().await.update(id, None, patch)
    }

    async fn update_user_if(
        &self,
        id: UserId,
        condition: &UserFilter,
        patch: &UserPatch,
    ) -> Result<(), RepositoryError> {
        self.users.write().await.update(id, Some(condition), patch)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::user::models::ResetToken;
    use crate::domain::user::models::SessionId;

    fn email(raw: &str) -> EmailAddress {
        EmailAddress::new(raw.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_add_user_assigns_increasing_ids() {
        let repository = InMemoryUserRepository::new();

        let first = repository.add_user(&email("a@x.com"), "h1").await.unwrap();
        let second = repository.add_user(&email("b@x.com"), "h2").await.unwrap();

        assert_eq!(first.id, UserId(1));
        assert_eq!(second.id, UserId(2));
        assert!(first.session_id.is_none());
        assert!(first.reset_token.is_none());
    }

    #[tokio::test]
    async fn test_add_user_duplicate_email() {
        let repository = InMemoryUserRepository::new();
        repository.add_user(&email("a@x.com"), "h1").await.unwrap();

        let result = repository.add_user(&email("a@x.com"), "h2").await;

        assert_eq!(
            result,
            Err(RepositoryError::DuplicateEmail("a@x.com".to_string()))
        );
        assert_eq!(repository.len().await, 1);
    }

    #[tokio::test]
    async fn test_find_user_by_returns_lowest_id() {
        let repository = InMemoryUserRepository::new();
        repository.add_user(&email("a@x.com"), "same").await.unwrap();
        repository.add_user(&email("b@x.com"), "same").await.unwrap();

        let filter = UserFilter::parse([("hashed_password", Some("same"))]).unwrap();
        let user = repository.find_user_by(&filter).await.unwrap();

        assert_eq!(user.id, UserId(1));
    }

    #[tokio::test]
    async fn test_find_user_by_not_found() {
        let repository = InMemoryUserRepository::new();
        repository.add_user(&email("a@x.com"), "h1").await.unwrap();

        let result = repository
            .find_user_by(&UserFilter::by_email(&email("b@x.com")))
            .await;

        assert_eq!(result, Err(RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_update_user() {
        let repository = InMemoryUserRepository::new();
        let user = repository.add_user(&email("a@x.com"), "h1").await.unwrap();

        let session_id = SessionId::new("abc".to_string());
        let patch = UserPatch::new()
            .session_id(Some(&session_id))
            .hashed_password("h2".to_string());
        repository.update_user(user.id, &patch).await.unwrap();

        let found = repository
            .find_user_by(&UserFilter::by_session_id("abc"))
            .await
            .unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.hashed_password, "h2");
    }

    #[tokio::test]
    async fn test_update_user_not_found() {
        let repository = InMemoryUserRepository::new();

        let result = repository
            .update_user(UserId(9), &UserPatch::new().session_id(None))
            .await;

        assert_eq!(result, Err(RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_update_user_is_all_or_nothing() {
        let repository = InMemoryUserRepository::new();
        let user = repository.add_user(&email("a@x.com"), "h1").await.unwrap();

        let patch = UserPatch::parse([("hashed_password", Some("h2")), ("email", Some("nope"))])
            .unwrap();
        let result = repository.update_user(user.id, &patch).await;

        assert!(matches!(result, Err(RepositoryError::InvalidFilter(_))));
        let unchanged = repository
            .find_user_by(&UserFilter::by_id(user.id))
            .await
            .unwrap();
        assert_eq!(unchanged.hashed_password, "h1");
    }

    #[tokio::test]
    async fn test_update_user_duplicate_email() {
        let repository = InMemoryUserRepository::new();
        repository.add_user(&email("a@x.com"), "h1").await.unwrap();
        let user = repository.add_user(&email("b@x.com"), "h2").await.unwrap();

        let patch = UserPatch::parse([("email", Some("a@x.com"))]).unwrap();
        let result = repository.update_user(user.id, &patch).await;

        assert!(matches!(result, Err(RepositoryError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_update_user_if_requires_condition() {
        let repository = InMemoryUserRepository::new();
        let user = repository.add_user(&email("a@x.com"), "h1").await.unwrap();
        let condition = UserFilter::by_reset_token("reset");

        let patch = UserPatch::new().hashed_password("h2".to_string());
        let result = repository.update_user_if(user.id, &condition, &patch).await;
        assert_eq!(result, Err(RepositoryError::NotFound));

        let token = ResetToken::new("reset".to_string());
        repository
            .update_user(user.id, &UserPatch::new().reset_token(Some(&token)))
            .await
            .unwrap();

        let patch = patch.reset_token(None);
        repository
            .update_user_if(user.id, &condition, &patch)
            .await
            .unwrap();
        let result = repository.update_user_if(user.id, &condition, &patch).await;
        assert_eq!(result, Err(RepositoryError::NotFound));

        let found = repository
            .find_user_by(&UserFilter::by_id(user.id))
            .await
            .unwrap();
        assert_eq!(found.hashed_password, "h2");
        assert!(found.reset_token.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_conditional_updates_admit_one() {
        let repository = Arc::new(InMemoryUserRepository::new());
        let user_id = repository.add_user(&email("a@x.com"), "h").await.unwrap().id;
        let token = ResetToken::new("reset".to_string());
        repository
            .update_user(user_id, &UserPatch::new().reset_token(Some(&token)))
            .await
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let repository = Arc::clone(&repository);
                tokio::spawn(async move {
                    let patch = UserPatch::new()
                        .hashed_password(format!("h{i}"))
                        .reset_token(None);
                    repository
                        .update_user_if(user_id, &UserFilter::by_reset_token("reset"), &patch)
                        .await
                })
            })
            .collect();

        let mut applied = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                applied += 1;
            }
        }

        assert_eq!(applied, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_keep_email_unique() {
        let repository = Arc::new(InMemoryUserRepository::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let repository = Arc::clone(&repository);
                tokio::spawn(async move { repository.add_user(&email("a@x.com"), "h").await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(repository.len().await, 1);
    }
}

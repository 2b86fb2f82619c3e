use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use sqlx::Postgres;
use sqlx::QueryBuilder;

use crate::config::DatabaseConfig;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::FieldValue;
use crate::domain::user::models::ResetToken;
use crate::domain::user::models::SessionId;
use crate::domain::user::models::User;
use crate::domain::user::models::UserField;
use crate::domain::user::models::UserFilter;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserPatch;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::RepositoryError;

const EMAIL_CONSTRAINT: &str = "users_email_key";
const USER_COLUMNS: &str = "id, email, hashed_password, session_id, reset_token";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    hashed_password: String,
    session_id: Option<String>,
    reset_token: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId(row.id),
            email: EmailAddress::new(row.email)
                .map_err(|e| RepositoryError::Database(e.to_string()))?,
            hashed_password: row.hashed_password,
            session_id: row.session_id.map(SessionId::new),
            reset_token: row.reset_token.map(ResetToken::new),
        })
    }
}

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open the connection pool and bring the schema up to date.
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .context("connect to database")?;
        tracing::info!(
            max_connections = config.max_connections,
            database = "postgresql",
            "Database connection pool created"
        );

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("run database migrations")?;
        tracing::info!(database = "postgresql", "Database migrations completed");

        Ok(Self::new(pool))
    }

    fn map_write_error(e: sqlx::Error, email: Option<&str>) -> RepositoryError {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() && db_err.constraint() == Some(EMAIL_CONSTRAINT) {
                return RepositoryError::DuplicateEmail(email.unwrap_or_default().to_string());
            }
        }
        RepositoryError::Database(e.to_string())
    }

    async fn apply_patch(
        &self,
        id: UserId,
        condition: Option<&UserFilter>,
        patch: &UserPatch,
    ) -> Result<(), RepositoryError> {
        if patch.is_empty() {
            let mut filter = UserFilter::by_id(id);
            for (field, value) in condition.map(UserFilter::conditions).unwrap_or_default() {
                filter = filter.and(*field, value.clone())?;
            }
            return self.find_user_by(&filter).await.map(|_| ());
        }

        let mut new_email = None;
        let mut query = QueryBuilder::<Postgres>::new("UPDATE users SET ");
        for (i, (field, value)) in patch.changes().iter().enumerate() {
            if i > 0 {
                query.push(", ");
            }
            if let FieldValue::Text(text) = value {
                if *field == UserField::Email {
                    EmailAddress::new(text.clone())
                        .map_err(|e| RepositoryError::InvalidFilter(e.to_string()))?;
                    new_email = Some(text.as_str());
                }
            }
            query.push(field.column());
            query.push(" = ");
            push_value(&mut query, value);
        }
        query.push(" WHERE id = ");
        query.push_bind(id.0);
        if let Some(condition) = condition {
            for (field, value) in condition.conditions() {
                query.push(" AND ");
                push_condition(&mut query, *field, value);
            }
        }

        let result = query
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| Self::map_write_error(e, new_email))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

fn push_value(query: &mut QueryBuilder<'_, Postgres>, value: &FieldValue) {
    match value {
        FieldValue::Id(id) => {
            query.push_bind(id.0);
        }
        FieldValue::Text(text) => {
            query.push_bind(text.clone());
        }
        FieldValue::Null => {
            query.push_bind(None::<String>);
        }
    }
}

fn push_condition(query: &mut QueryBuilder<'_, Postgres>, field: UserField, value: &FieldValue) {
    query.push(field.column());
    if *value == FieldValue::Null {
        query.push(" IS NULL");
    } else {
        query.push(" = ");
        push_value(query, value);
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn add_user(
        &self,
        email: &EmailAddress,
        hashed_password: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (email, hashed_password)
            VALUES ($1, $2)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(email.as_str())
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(e, Some(email.as_str())))?;

        row.try_into()
    }

    async fn find_user_by(&self, filter: &UserFilter) -> Result<User, RepositoryError> {
        if filter.conditions().is_empty() {
            return Err(RepositoryError::InvalidFilter("empty filter".to_string()));
        }

        let mut query =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM users WHERE ", USER_COLUMNS));
        for (i, (field, value)) in filter.conditions().iter().enumerate() {
            if i > 0 {
                query.push(" AND ");
            }
            push_condition(&mut query, *field, value);
        }
        query.push(" ORDER BY id ASC LIMIT 1");

        let row = query
            .build_query_as::<UserRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        match row {
            Some(r) => r.try_into(),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn update_user(&self, id: UserId, patch: &UserPatch) -> Result<(), RepositoryError> {
        self.apply_patch(id, None, patch).await
    }

    async fn update_user_if(
        &self,
        id: UserId,
        condition: &UserFilter,
        patch: &UserPatch,
    ) -> Result<(), RepositoryError> {
        self.apply_patch(id, Some(condition), patch).await
    }
}

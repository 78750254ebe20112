//! User credential persistence

use crate::{error::StoreError, models::user::UserCredentialRecord};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Store contract for user credentials
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user_by_email(&self, email: &str)
        -> Result<Option<UserCredentialRecord>, StoreError>;

    /// Fails with `StoreError::Conflict` if the email is taken
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<UserCredentialRecord, StoreError>;

    /// Replace email and password hash. `None` if the user does not exist.
    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<UserCredentialRecord>, StoreError>;

    /// Mark the user as upgraded. Returns whether the user exists.
    async fn upgrade_user(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// PostgreSQL-backed user store
#[derive(Clone)]
pub struct UserRepository {
    db: PgPool,
}

impl UserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_unique_violation(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict("email already registered".to_string())
        }
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn get_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentialRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserCredentialRecord>(
            r#"
            SELECT id, email, password_hash, is_chirpy_red, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<UserCredentialRecord, StoreError> {
        let user = sqlx::query_as::<_, UserCredentialRecord>(
            r#"
            INSERT INTO users (id, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING id, email, password_hash, is_chirpy_red, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(map_unique_violation)?;

        Ok(user)
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<UserCredentialRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserCredentialRecord>(
            r#"
            UPDATE users
            SET email = $2, password_hash = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, password_hash, is_chirpy_red, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&self.db)
        .await
        .map_err(map_unique_violation)?;

        Ok(user)
    }

    async fn upgrade_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET is_chirpy_red = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

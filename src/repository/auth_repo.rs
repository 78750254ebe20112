//! Refresh token persistence

use crate::{error::StoreError, models::auth::RefreshToken};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Store contract for refresh tokens.
///
/// Implementations must make `revoke_refresh_token` a single-row atomic
/// update and reject duplicate token values on create.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn create_refresh_token(&self, token: &RefreshToken) -> Result<(), StoreError>;

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, StoreError>;

    /// Set `revoked_at` if it is not already set. Returns whether a row changed.
    async fn revoke_refresh_token(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}

/// PostgreSQL-backed refresh token store
#[derive(Clone)]
pub struct AuthRepository {
    db: PgPool,
}

impl AuthRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RefreshTokenStore for AuthRepository {
    async fn create_refresh_token(&self, token: &RefreshToken) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token, user_id, created_at, updated_at, expires_at)
            VALUES ($1, $2, $3, $3, $4)
            "#,
        )
        .bind(&token.token)
        .bind(token.user_id)
        .bind(token.created_at)
        .bind(token.expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, StoreError> {
        let record = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT token, user_id, created_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?;

        Ok(record)
    }

    async fn revoke_refresh_token(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $2, updated_at = $2
            WHERE token = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(token)
        .bind(revoked_at)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

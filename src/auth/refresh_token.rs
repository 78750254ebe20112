//! Opaque refresh tokens
//!
//! A refresh token is 32 random bytes, hex encoded. Its state lives in the
//! store: it is usable while `revoked_at` is unset and `now < expires_at`.
//! Expiry is checked when the token is presented; nothing sweeps old rows.

use crate::{
    config::DEFAULT_REFRESH_TOKEN_EXP_SECS, error::AuthError, models::auth::RefreshToken,
    repository::auth_repo::RefreshTokenStore,
};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;
use uuid::Uuid;

/// Random bytes per token (256 bits)
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Draw a new token from the OS CSPRNG: 64 lowercase hex characters
pub fn generate() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Issues, validates and revokes refresh tokens against a store
#[derive(Clone)]
pub struct RefreshTokenService {
    store: Arc<dyn RefreshTokenStore>,
    ttl: Duration,
}

impl RefreshTokenService {
    pub fn new(store: Arc<dyn RefreshTokenStore>) -> Self {
        Self {
            store,
            ttl: Duration::seconds(DEFAULT_REFRESH_TOKEN_EXP_SECS as i64),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create and persist a token for `user_id`
    pub async fn issue(&self, user_id: Uuid) -> Result<RefreshToken, AuthError> {
        self.issue_at(user_id, Utc::now()).await
    }

    pub async fn issue_at(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<RefreshToken, AuthError> {
        let record = RefreshToken {
            token: generate(),
            user_id,
            created_at: now,
            expires_at: now + self.ttl,
            revoked_at: None,
        };

        self.store.create_refresh_token(&record).await?;

        tracing::debug!(%user_id, expires_at = %record.expires_at, "Refresh token issued");

        Ok(record)
    }

    /// Resolve a presented token to its user
    pub async fn validate(&self, token: &str) -> Result<Uuid, AuthError> {
        self.validate_at(token, Utc::now()).await
    }

    pub async fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, AuthError> {
        let record = self
            .store
            .get_refresh_token(token)
            .await?
            .ok_or(AuthError::NotFound)?;

        if !record.is_usable_at(now) {
            return Err(if record.is_expired_at(now) {
                AuthError::Expired
            } else {
                AuthError::Revoked
            });
        }

        Ok(record.user_id)
    }

    /// Revoke a token. Revoking twice is not an error and keeps the first
    /// `revoked_at`.
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        self.revoke_at(token, Utc::now()).await
    }

    pub async fn revoke_at(&self, token: &str, now: DateTime<Utc>) -> Result<(), AuthError> {
        let record = self
            .store
            .get_refresh_token(token)
            .await?
            .ok_or(AuthError::NotFound)?;

        if record.is_revoked() {
            tracing::debug!(user_id = %record.user_id, "Refresh token already revoked");
            return Ok(());
        }

        if self.store.revoke_refresh_token(token, now).await? {
            tracing::debug!(user_id = %record.user_id, "Refresh token revoked");
        } else {
            // lost a race with a concurrent revoke
            tracing::debug!(user_id = %record.user_id, "Refresh token already revoked");
        }

        Ok(())
    }
}

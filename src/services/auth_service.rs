//! Authentication service: login, token refresh, revocation, request
//! authentication, registration and the upgrade webhook.

use crate::{
    auth::{
        credential::{extract_api_key, extract_bearer},
        jwt::AccessTokenCodec,
        password::PasswordHasher,
        refresh_token::RefreshTokenService,
    },
    config::{AppConfig, DEFAULT_ACCESS_TOKEN_EXP_SECS},
    error::{AuthError, StoreError},
    models::{
        auth::{CredentialsRequest, Session, UpgradeOutcome, WebhookEvent, USER_UPGRADED_EVENT},
        user::UserCredentialRecord,
    },
    repository::{auth_repo::RefreshTokenStore, user_repo::UserStore},
};
use axum::http::HeaderMap;
use chrono::Duration;
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct AuthService {
    users: Arc<dyn UserStore>,
    refresh_tokens: RefreshTokenService,
    codec: AccessTokenCodec,
    hasher: PasswordHasher,
    polka_key: Option<Secret<String>>,
    access_token_ttl: Duration,
}

impl AuthService {
    pub fn new(
        codec: AccessTokenCodec,
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn RefreshTokenStore>,
    ) -> Self {
        Self {
            users,
            refresh_tokens: RefreshTokenService::new(tokens),
            codec,
            hasher: PasswordHasher::new(),
            polka_key: None,
            access_token_ttl: Duration::seconds(DEFAULT_ACCESS_TOKEN_EXP_SECS as i64),
        }
    }

    pub fn from_config(
        config: &AppConfig,
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn RefreshTokenStore>,
    ) -> Result<Self, AuthError> {
        let security = &config.security;
        let mut service = Self::new(AccessTokenCodec::from_config(config)?, users, tokens)
            .with_access_token_ttl(Duration::seconds(security.access_token_exp_secs as i64))
            .with_refresh_token_ttl(Duration::seconds(security.refresh_token_exp_secs as i64));
        service.polka_key = security.polka_key.clone();
        Ok(service)
    }

    /// Key expected on `Authorization: ApiKey <key>` for the upgrade webhook
    pub fn with_polka_key(mut self, key: Secret<String>) -> Self {
        self.polka_key = Some(key);
        self
    }

    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    pub fn with_refresh_token_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_tokens = self.refresh_tokens.with_ttl(ttl);
        self
    }

    pub fn codec(&self) -> &AccessTokenCodec {
        &self.codec
    }

    pub fn refresh_tokens(&self) -> &RefreshTokenService {
        &self.refresh_tokens
    }

    /// Log in with email and password.
    ///
    /// An unknown email and a wrong password both surface as
    /// `InvalidCredentials`; only the log line tells them apart.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let user = match self.users.get_user_by_email(email).await? {
            Some(user) => user,
            None => {
                // same hashing cost as a wrong password
                let _ = self.hasher.verify_missing(password);
                tracing::info!(reason = "unknown_user", "Login rejected");
                metrics::counter!("auth_login_total", "outcome" => "unknown_user").increment(1);
                return Err(AuthError::InvalidCredentials);
            }
        };

        if let Err(e) = self.hasher.verify(password, &user.password_hash) {
            tracing::info!(user_id = %user.id, reason = e.kind(), "Login rejected");
            metrics::counter!("auth_login_total", "outcome" => "password_mismatch").increment(1);
            return Err(AuthError::InvalidCredentials);
        }

        let refresh_token = self.refresh_tokens.issue(user.id).await?;
        let access_token = self.codec.issue(&user.id, self.access_token_ttl)?;

        tracing::info!(user_id = %user.id, "Login succeeded");
        metrics::counter!("auth_login_total", "outcome" => "success").increment(1);

        Ok(Session {
            user_id: user.id,
            access_token,
            refresh_token: refresh_token.token,
            expires_in: self.access_token_ttl.num_seconds().max(0) as u64,
        })
    }

    /// Exchange a refresh token for a new access token. The refresh token is
    /// neither rotated nor extended.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<String, AuthError> {
        let user_id = match self.refresh_tokens.validate(refresh_token).await {
            Ok(user_id) => user_id,
            Err(e) => {
                tracing::info!(kind = e.kind(), "Refresh rejected");
                metrics::counter!("auth_refresh_total", "outcome" => e.kind()).increment(1);
                return Err(e);
            }
        };

        let access_token = self.codec.issue(&user_id, self.access_token_ttl)?;

        metrics::counter!("auth_refresh_total", "outcome" => "success").increment(1);

        Ok(access_token)
    }

    /// Revoke the session behind a refresh token
    pub async fn revoke_session(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.refresh_tokens.revoke(refresh_token).await.map_err(|e| {
            tracing::info!(kind = e.kind(), "Revoke rejected");
            e
        })?;

        metrics::counter!("auth_revoke_total").increment(1);

        Ok(())
    }

    /// Gate for protected endpoints: bearer access token to user id
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Uuid, AuthError> {
        let token = extract_bearer(headers)?;
        self.codec.validate(&token)
    }

    /// Create an account
    pub async fn register(
        &self,
        req: &CredentialsRequest,
    ) -> Result<UserCredentialRecord, AuthError> {
        validate_request(req)?;

        let password_hash = self.hasher.hash(&req.password)?;
        let user = self
            .users
            .create_user(&req.email, &password_hash)
            .await
            .map_err(conflict_to_request_error)?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(user)
    }

    /// Replace the caller's email and password
    pub async fn change_credentials(
        &self,
        headers: &HeaderMap,
        req: &CredentialsRequest,
    ) -> Result<UserCredentialRecord, AuthError> {
        let user_id = self.authenticate(headers)?;
        validate_request(req)?;

        let password_hash = self.hasher.hash(&req.password)?;
        let user = self
            .users
            .update_credentials(user_id, &req.email, &password_hash)
            .await
            .map_err(conflict_to_request_error)?
            .ok_or(AuthError::UserNotFound)?;

        tracing::info!(%user_id, "User credentials changed");

        Ok(user)
    }

    /// Payment provider webhook: upgrade a user after `user.upgraded`
    pub async fn upgrade_privilege(
        &self,
        headers: &HeaderMap,
        event: &WebhookEvent,
    ) -> Result<UpgradeOutcome, AuthError> {
        let key = extract_api_key(headers)?;

        let Some(expected) = &self.polka_key else {
            tracing::warn!("Upgrade webhook called but no API key is configured");
            return Err(AuthError::InvalidApiKey);
        };

        if !constant_time_eq(key.as_bytes(), expected.expose_secret().as_bytes()) {
            return Err(AuthError::InvalidApiKey);
        }

        if event.event != USER_UPGRADED_EVENT {
            tracing::debug!(event = %event.event, "Webhook event ignored");
            return Ok(UpgradeOutcome::Ignored);
        }

        let user_id =
            Uuid::parse_str(&event.data.user_id).map_err(|_| AuthError::InvalidUserId)?;

        if !self.users.upgrade_user(user_id).await? {
            return Err(AuthError::UserNotFound);
        }

        tracing::info!(%user_id, "User upgraded");

        Ok(UpgradeOutcome::Upgraded)
    }
}

fn validate_request(req: &CredentialsRequest) -> Result<(), AuthError> {
    req.validate()
        .map_err(|e| AuthError::InvalidRequest(e.to_string()))
}

fn conflict_to_request_error(e: StoreError) -> AuthError {
    match e {
        StoreError::Conflict(_) => {
            AuthError::InvalidRequest("Email already registered".to_string())
        }
        other => AuthError::StoreUnavailable(other),
    }
}

/// Byte comparison whose running time depends only on the lengths
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }

    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"polka-key", b"polka-key"));
        assert!(!constant_time_eq(b"polka-key", b"polka-kez"));
        assert!(!constant_time_eq(b"polka-key", b"polka-key-longer"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_conflict_maps_to_request_error() {
        let err = conflict_to_request_error(StoreError::Conflict("dup".to_string()));
        assert!(matches!(err, AuthError::InvalidRequest(_)));

        let err = conflict_to_request_error(StoreError::Unavailable("down".to_string()));
        assert!(matches!(err, AuthError::StoreUnavailable(_)));
    }
}

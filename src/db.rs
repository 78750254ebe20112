//! Postgres bootstrap for the credential and refresh-token stores

use crate::{
    config::{AppConfig, DatabaseConfig},
    error::AuthError,
    repository::{AuthRepository, UserRepository},
    services::AuthService,
};
use secrecy::ExposeSecret;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{sync::Arc, time::Duration};

/// Both Postgres stores over one pool
#[derive(Clone)]
pub struct PgStores {
    pool: PgPool,
    pub users: Arc<UserRepository>,
    pub refresh_tokens: Arc<AuthRepository>,
}

impl PgStores {
    /// Open the pool, bring the schema up to date and wrap the stores
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        let pool = create_pool(config).await?;
        run_migrations(&pool).await?;
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            refresh_tokens: Arc::new(AuthRepository::new(pool.clone())),
            pool,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Auth service backed by these stores
    pub fn auth_service(&self, config: &AppConfig) -> Result<AuthService, AuthError> {
        AuthService::from_config(config, self.users.clone(), self.refresh_tokens.clone())
    }

    /// Round-trip a trivial query; store outages surface here first
    pub async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::Unreachable(e.to_string()))?;
        Ok(())
    }
}

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .test_before_acquire(true)
        .connect(config.url.expose_secret())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Credential store unreachable");
            DbError::ConnectionFailed(e.to_string())
        })?;

    tracing::info!(
        max_connections = config.max_connections,
        "Credential store pool ready"
    );

    Ok(pool)
}

/// Apply `migrations/` (users, refresh_tokens)
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        tracing::error!(error = %e, "Auth schema migration failed");
        DbError::MigrationFailed(e.to_string())
    })?;

    tracing::debug!("Auth schema up to date");
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Store unreachable: {0}")]
    Unreachable(String),
}

impl From<DbError> for AuthError {
    fn from(e: DbError) -> Self {
        AuthError::StoreUnavailable(crate::error::StoreError::Unavailable(e.to_string()))
    }
}

//! Configuration
//! Loaded from environment variables; secrets are wrapped in `Secret`.

use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

/// Access token lifetime used by login and refresh (one hour).
pub const DEFAULT_ACCESS_TOKEN_EXP_SECS: u64 = 3600;

/// Refresh token lifetime (60 days).
pub const DEFAULT_REFRESH_TOKEN_EXP_SECS: u64 = 60 * 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error
    pub level: String,
    /// json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// HMAC key for access tokens
    pub jwt_secret: Secret<String>,
    /// Shared key the payment provider sends as `Authorization: ApiKey <key>`
    pub polka_key: Option<Secret<String>>,
    pub access_token_exp_secs: u64,
    pub refresh_token_exp_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

impl AppConfig {
    /// Load configuration from `CHIRPY_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        settings = settings
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("database.max_lifetime_secs", 1800)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("security.jwt_secret", "change-this-secret-in-production-min-32-chars!")?
            .set_default("security.access_token_exp_secs", DEFAULT_ACCESS_TOKEN_EXP_SECS)?
            .set_default("security.refresh_token_exp_secs", DEFAULT_REFRESH_TOKEN_EXP_SECS)?;

        // e.g. CHIRPY_SECURITY__JWT_SECRET
        settings = settings.add_source(
            Environment::with_prefix("CHIRPY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        if self.database.max_connections < self.database.min_connections {
            return Err(ConfigError::Message(
                "max_connections must be >= min_connections".to_string(),
            ));
        }

        if self.security.jwt_secret.expose_secret().len() < 32 {
            return Err(ConfigError::Message(
                "JWT secret must be at least 32 characters long".to_string(),
            ));
        }

        if let Some(key) = &self.security.polka_key {
            if key.expose_secret().trim().is_empty() {
                return Err(ConfigError::Message("polka_key must not be blank".to_string()));
            }
        }

        if self.security.access_token_exp_secs < 60 || self.security.access_token_exp_secs > 86400 {
            return Err(ConfigError::Message(
                "access_token_exp_secs must be between 60 and 86400 (1 minute to 24 hours)"
                    .to_string(),
            ));
        }

        if self.security.refresh_token_exp_secs < 3600
            || self.security.refresh_token_exp_secs > 7_776_000
        {
            return Err(ConfigError::Message(
                "refresh_token_exp_secs must be between 3600 and 7776000 (1 hour to 90 days)"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

/// Load `.env` files for local development.
///
/// `CHIRPY_ENV=foo` selects `.env.foo`; otherwise `.env.local` then `.env`.
/// Production sets real environment variables and never relies on these.
pub fn load_dotenv() {
    if let Ok(name) = std::env::var("CHIRPY_ENV") {
        dotenv::from_filename(format!(".env.{}", name)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();
    }
}

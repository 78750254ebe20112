//! Error model for the authentication subsystem
//! Every failure is terminal for the current request and maps to one HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Failures reported by a credential or token store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Unique constraint rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Authentication error kinds
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing credential")]
    MissingCredential,

    #[error("Malformed credential")]
    MalformedCredential,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Token revoked")]
    Revoked,

    #[error("Token issuer mismatch")]
    IssuerMismatch,

    #[error("Malformed token")]
    MalformedToken,

    /// Login failure; unknown email and wrong password are not distinguished
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Refresh token lookup miss
    #[error("Refresh token not found")]
    NotFound,

    #[error("Password hash mismatch")]
    HashMismatch,

    #[error("Store error: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Invalid user id")]
    InvalidUserId,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential
            | AuthError::MalformedCredential
            | AuthError::InvalidSignature
            | AuthError::Expired
            | AuthError::Revoked
            | AuthError::IssuerMismatch
            | AuthError::MalformedToken
            | AuthError::InvalidCredentials
            | AuthError::NotFound
            | AuthError::HashMismatch
            | AuthError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            AuthError::InvalidUserId | AuthError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::StoreUnavailable(_) | AuthError::Config(_) | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to the caller
    pub fn user_message(&self) -> String {
        match self {
            AuthError::MissingCredential => "Missing authorization header".to_string(),
            AuthError::MalformedCredential => "Malformed authorization header".to_string(),
            AuthError::InvalidSignature
            | AuthError::IssuerMismatch
            | AuthError::MalformedToken => "Invalid token".to_string(),
            AuthError::Expired => "Token expired".to_string(),
            AuthError::Revoked => "Refresh token has been revoked".to_string(),
            AuthError::InvalidCredentials | AuthError::HashMismatch => {
                "Incorrect email or password".to_string()
            }
            AuthError::NotFound => "Couldn't find refresh token".to_string(),
            AuthError::InvalidApiKey => "Invalid API key".to_string(),
            AuthError::InvalidUserId => "Invalid user id".to_string(),
            AuthError::UserNotFound => "User not found".to_string(),
            AuthError::InvalidRequest(msg) => msg.clone(),
            AuthError::StoreUnavailable(_) => "Storage error occurred".to_string(),
            AuthError::Config(_) => "Configuration error".to_string(),
            AuthError::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// Stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::MalformedCredential => "malformed_credential",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::Expired => "expired",
            AuthError::Revoked => "revoked",
            AuthError::IssuerMismatch => "issuer_mismatch",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::NotFound => "not_found",
            AuthError::HashMismatch => "hash_mismatch",
            AuthError::StoreUnavailable(_) => "store_unavailable",
            AuthError::InvalidApiKey => "invalid_api_key",
            AuthError::InvalidUserId => "invalid_user_id",
            AuthError::UserNotFound => "user_not_found",
            AuthError::InvalidRequest(_) => "invalid_request",
            AuthError::Config(_) => "config",
            AuthError::Internal(_) => "internal",
        }
    }

    pub fn code(&self) -> u16 {
        self.status_code().as_u16()
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::StoreUnavailable(StoreError::Database(e))
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: u16,
    pub message: String,
    pub request_id: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code(),
                message: self.user_message(),
                request_id,
            },
        };

        if status.is_server_error() {
            tracing::error!(
                code = self.code(),
                kind = self.kind(),
                message = %self,
                request_id = %error_response.error.request_id,
                "Authentication subsystem error"
            );
        } else {
            tracing::debug!(
                code = self.code(),
                kind = self.kind(),
                request_id = %error_response.error.request_id,
                "Request rejected"
            );
        }

        (status, Json(error_response)).into_response()
    }
}

impl From<config::ConfigError> for AuthError {
    fn from(e: config::ConfigError) -> Self {
        AuthError::Config(e.to_string())
    }
}

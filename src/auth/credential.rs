//! Authorization header parsing

use crate::error::AuthError;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use std::fmt;

/// Authorization scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Bearer,
    ApiKey,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Bearer => "Bearer",
            Scheme::ApiKey => "ApiKey",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw credential pulled from a request
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub scheme: Scheme,
    pub value: String,
}

// Keeps token values out of logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("scheme", &self.scheme)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Parse `Authorization: <scheme> <value>`.
///
/// The scheme must match exactly (case-sensitive). Fields after the value are
/// ignored.
pub fn extract_credential(headers: &HeaderMap, scheme: Scheme) -> Result<Credential, AuthError> {
    let raw = headers.get(AUTHORIZATION).ok_or(AuthError::MissingCredential)?;
    let raw = raw.to_str().map_err(|_| AuthError::MalformedCredential)?;

    let mut fields = raw.split_whitespace();
    let first = fields.next().ok_or(AuthError::MissingCredential)?;
    if first != scheme.as_str() {
        return Err(AuthError::MalformedCredential);
    }

    let value = fields.next().ok_or(AuthError::MalformedCredential)?;

    Ok(Credential {
        scheme,
        value: value.to_string(),
    })
}

/// Token from `Authorization: Bearer <token>`
pub fn extract_bearer(headers: &HeaderMap) -> Result<String, AuthError> {
    extract_credential(headers, Scheme::Bearer).map(|c| c.value)
}

/// Key from `Authorization: ApiKey <key>`
pub fn extract_api_key(headers: &HeaderMap) -> Result<String, AuthError> {
    extract_credential(headers, Scheme::ApiKey).map(|c| c.value)
}

//! Request gate for protected endpoints

use crate::{error::AuthError, services::auth_service::AuthService};
use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

/// Authenticated caller, attached to request extensions by [`require_auth`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
}

// Lets handlers take `AuthUser` as an argument
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(AuthError::MissingCredential)
    }
}

/// Reject the request unless it carries a valid bearer access token
pub async fn require_auth(
    State(auth): State<Arc<AuthService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user_id = auth.authenticate(req.headers())?;

    req.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(req).await)
}

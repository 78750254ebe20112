//! Authentication primitives

pub mod credential;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod refresh_token;

pub use credential::{extract_api_key, extract_bearer, extract_credential, Credential, Scheme};
pub use jwt::{AccessClaims, AccessTokenCodec, ISSUER};
pub use middleware::{require_auth, AuthUser};
pub use password::PasswordHasher;
pub use refresh_token::RefreshTokenService;

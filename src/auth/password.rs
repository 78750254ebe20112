//! Password hashing and verification using Argon2id
//!
//! Hashes are PHC strings (`$argon2id$v=19$...`) carrying their own salt and
//! parameters, so callers treat them as opaque. Argon2 consumes the full
//! password, but callers should not assume any length beyond what the
//! algorithm documents is distinguished.

use crate::error::AuthError;
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

// OWASP baseline for Argon2id: m=19MiB, t=2, p=1
const MEMORY_COST_KIB: u32 = 19 * 1024;
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;

/// Password hasher with fixed cost parameters
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    pub fn new() -> Self {
        let params =
            Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None).unwrap_or_default();

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        Self { argon2 }
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to hash password");
                AuthError::Internal(format!("Failed to hash password: {}", e))
            })?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a password against a stored hash.
    ///
    /// Fails closed: a malformed hash is reported as `HashMismatch`, same as a
    /// wrong password.
    pub fn verify(&self, password: &str, hash: &str) -> Result<(), AuthError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            tracing::debug!(error = %e, "Stored password hash could not be parsed");
            AuthError::HashMismatch
        })?;

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::HashMismatch)
    }

    /// Reject a password for an account that has no stored hash, after doing
    /// the same Argon2 work a real verification would.
    pub fn verify_missing(&self, password: &str) -> AuthError {
        let salt = SaltString::generate(&mut OsRng);
        let _ = self.argon2.hash_password(password.as_bytes(), &salt);
        AuthError::HashMismatch
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

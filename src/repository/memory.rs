//! In-process store backed by concurrent maps
//!
//! Implements both store contracts; each operation touches one entry, which
//! matches the single-row atomicity the auth layer relies on.

use crate::{
    error::StoreError,
    models::{auth::RefreshToken, user::UserCredentialRecord},
    repository::{auth_repo::RefreshTokenStore, user_repo::UserStore},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    tokens: DashMap<String, RefreshToken>,
    users: DashMap<Uuid, UserCredentialRecord>,
    // email -> user id
    emails: DashMap<String, Uuid>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn create_refresh_token(&self, token: &RefreshToken) -> Result<(), StoreError> {
        match self.tokens.entry(token.token.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict("duplicate refresh token".to_string())),
            Entry::Vacant(slot) => {
                slot.insert(token.clone());
                Ok(())
            }
        }
    }

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, StoreError> {
        Ok(self.tokens.get(token).map(|r| r.value().clone()))
    }

    async fn revoke_refresh_token(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        match self.tokens.get_mut(token) {
            Some(mut record) if record.revoked_at.is_none() => {
                record.revoked_at = Some(revoked_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentialRecord>, StoreError> {
        let Some(id) = self.emails.get(email).map(|r| *r.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<UserCredentialRecord, StoreError> {
        let now = Utc::now();
        let user = UserCredentialRecord {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_chirpy_red: false,
            created_at: now,
            updated_at: now,
        };

        match self.emails.entry(email.to_string()) {
            Entry::Occupied(_) => {
                return Err(StoreError::Conflict("email already registered".to_string()))
            }
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            }
        }
        self.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<UserCredentialRecord>, StoreError> {
        let Some(mut user) = self.users.get_mut(&id) else {
            return Ok(None);
        };

        if user.email != email {
            match self.emails.entry(email.to_string()) {
                Entry::Occupied(_) => {
                    return Err(StoreError::Conflict("email already registered".to_string()))
                }
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
            self.emails.remove(&user.email);
            user.email = email.to_string();
        }

        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn upgrade_user(&self, id: Uuid) -> Result<bool, StoreError> {
        match self.users.get_mut(&id) {
            Some(mut user) => {
                user.is_chirpy_red = true;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

//! User credential models

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// The slice of a user account the auth subsystem reads and writes
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserCredentialRecord {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_chirpy_red: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

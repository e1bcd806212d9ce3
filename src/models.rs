//! Gallery Vault - Entities
//!
//! Users and subjects, plus the listing views handed to the web layer.
//! Relationships are plain ids; nothing here holds a reference to another entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;
pub type PhotoId = Uuid;
pub type SubjectId = Uuid;

/// Registered account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    /// Globally unique
    pub username: String,
    /// Argon2id PHC string of the login password
    pub password_hash: String,
}

impl User {
    pub fn new(username: &str, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash,
        }
    }
}

/// Public view of a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserOut {
    pub id: UserId,
    pub username: String,
}

impl From<&User> for UserOut {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// Subject label. `name` is unique per owner, not globally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub owner_id: UserId,
}

impl Subject {
    pub fn new(name: &str, owner_id: UserId) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            owner_id,
        }
    }
}

/// Photo metadata without any encrypted payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoSummary {
    pub id: PhotoId,
    pub filename: String,
    pub filter_applied: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub owner_id: UserId,
    pub subject_id: Option<SubjectId>,
    pub subject_name: Option<String>,
    pub mime_type: String,
}

/// Bearer token returned by login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

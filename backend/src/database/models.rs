//! Rust structs that represent database table mappings.
//!
//! These models define the structure of data as it is stored in and retrieved
//! from the database. Note that these may differ from API-specific models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Identity provider a user signed up with.
///
/// `Email` accounts carry a password hash; federated accounts never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Provider {
    Email,
    Google,
    Github,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Email => "email",
            Provider::Google => "google",
            Provider::Github => "github",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub provider: Provider,
    pub profile_picture_url: Option<String>,
    pub role: String,
    pub email_verified: bool,
    #[serde(skip_serializing)]
    pub verify_token: Option<String>,
    #[serde(skip_serializing)]
    pub verify_token_exp: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_exp: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token_exp: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One outstanding credential token: the digest and its expiry.
///
/// A slot is always written or cleared as a whole, never one half of the pair.
#[derive(Debug, Clone, PartialEq)]
pub struct SecretSlot {
    pub hash: String,
    pub expires_at: DateTime<Utc>,
}

impl SecretSlot {
    pub fn new(hash: String, expires_at: DateTime<Utc>) -> Self {
        Self { hash, expires_at }
    }
}

/// Insert payload for a new user row.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: String,
    pub email: String,
    pub username: String,
    pub name: String,
    pub password_hash: Option<String>,
    pub provider: Provider,
    pub profile_picture_url: Option<String>,
    pub email_verified: bool,
    pub verify_token: Option<SecretSlot>,
}

/// Partial update applied to a user row.
///
/// `None` leaves a column untouched. For the secret slots, `Some(Some(slot))`
/// writes the pair and `Some(None)` clears both columns.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub provider: Option<Provider>,
    pub profile_picture_url: Option<String>,
    pub email_verified: Option<bool>,
    pub verify_token: Option<Option<SecretSlot>>,
    pub reset_token: Option<Option<SecretSlot>>,
    pub refresh_token: Option<Option<SecretSlot>>,
}

/// Lookup filter matched as an OR over the provided identifiers.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub id: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
}

impl UserFilter {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Default::default()
        }
    }

    pub fn by_username(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.email.is_none() && self.username.is_none()
    }
}
